//! # pdfstruct
//!
//! Layout reconstruction for PDF pages.
//!
//! Given the positioned text runs, vector primitives and raster images of a
//! page, this library rebuilds a human-meaningful document structure from
//! geometry and typography alone: titles, paragraphs in multi-column reading
//! order, tables, figures and charts, and the captions and footnotes that
//! belong to them.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pdfstruct::{extract_file, render};
//!
//! fn main() -> pdfstruct::Result<()> {
//!     let doc = extract_file("report.pdf")?;
//!
//!     let json = render::to_json(&doc, render::JsonFormat::Pretty)?;
//!     std::fs::write("extracted_data.json", json)?;
//!     render::write_csv_file(&doc, "extracted_data.csv")?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Region detection**: tables from line grids or text alignment, vector
//!   charts, logos, photographs and figures
//! - **Reading order**: column segmentation and continuation joining
//! - **Semantic roles**: title, heading, paragraph, caption, footnote, ...
//! - **Relationships**: section hierarchy, caption and footnote linking
//! - **Language annotation**: per block and per table cell, with document
//!   statistics
//! - **Parallel processing**: uses Rayon for multi-page documents
//! - **Pluggable input**: any [`DocumentSource`], including JSON primitive
//!   dumps

pub mod error;
pub mod geometry;
pub mod language;
pub mod layout;
pub mod model;
pub mod render;
pub mod source;

// Re-export commonly used types
pub use error::{Error, Result};
pub use geometry::BBox;
pub use language::{LanguageDetector, ScriptDetector};
pub use layout::{DocumentAssembler, ExtractOptions, FootnoteMatch};
pub use model::{
    ContentBlock, Document, Figure, Image, LanguageInfo, Metadata, MlFeatures, Page, Role, Table,
    TableCell, WritingSystem,
};
pub use render::JsonFormat;
pub use source::{DocumentContent, DocumentSource, PageContent, PageSource, PdfSource};

use std::path::Path;

/// Reconstruct the layout of a PDF file.
///
/// # Example
///
/// ```no_run
/// use pdfstruct::extract_file;
///
/// let doc = extract_file("report.pdf").unwrap();
/// println!("Pages: {}, blocks: {}", doc.page_count(), doc.block_count());
/// ```
pub fn extract_file<P: AsRef<Path>>(path: P) -> Result<Document> {
    extract_file_with_options(path, ExtractOptions::default())
}

/// Reconstruct the layout of a PDF file with custom options.
///
/// # Example
///
/// ```no_run
/// use pdfstruct::{extract_file_with_options, ExtractOptions};
///
/// let options = ExtractOptions::new()
///     .sequential()
///     .without_charts();
/// let doc = extract_file_with_options("report.pdf", options).unwrap();
/// ```
pub fn extract_file_with_options<P: AsRef<Path>>(
    path: P,
    options: ExtractOptions,
) -> Result<Document> {
    let source = PdfSource::open(path)?;
    Ok(extract_source(&source, options))
}

/// Reconstruct the layout of a PDF held in memory.
pub fn extract_bytes(data: &[u8]) -> Result<Document> {
    extract_bytes_with_options(data, ExtractOptions::default())
}

/// Reconstruct the layout of a PDF held in memory with custom options.
pub fn extract_bytes_with_options(data: &[u8], options: ExtractOptions) -> Result<Document> {
    let source = PdfSource::from_bytes(data)?;
    Ok(extract_source(&source, options))
}

/// Run the pipeline over any document source.
///
/// Pages the source fails to read are logged and emitted empty, so this
/// never fails once the source is open.
///
/// # Example
///
/// ```
/// use pdfstruct::{extract_source, DocumentContent, ExtractOptions, PageContent};
///
/// let content = DocumentContent::new(vec![PageContent::new(1, 612.0, 792.0)]);
/// let doc = extract_source(&content, ExtractOptions::default());
/// assert_eq!(doc.page_count(), 1);
/// ```
pub fn extract_source<D: DocumentSource + ?Sized>(source: &D, options: ExtractOptions) -> Document {
    DocumentAssembler::new(options).assemble(source)
}

/// Reconstruct the layout from a JSON primitives dump.
pub fn extract_primitives_file<P: AsRef<Path>>(
    path: P,
    options: ExtractOptions,
) -> Result<Document> {
    let content = DocumentContent::from_json_file(path)?;
    Ok(extract_source(&content, options))
}

/// Reconstruct the layout of a PDF file without blocking the async runtime.
///
/// The file is read with `tokio::fs` and the pipeline runs on the blocking
/// thread pool.
#[cfg(feature = "async")]
pub async fn extract_file_async<P: AsRef<Path>>(
    path: P,
    options: ExtractOptions,
) -> Result<Document> {
    let path = path.as_ref().to_path_buf();
    let data = tokio::fs::read(&path).await?;
    let source_file = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string());

    tokio::task::spawn_blocking(move || {
        let mut doc = extract_bytes_with_options(&data, options)?;
        doc.metadata.source_file = source_file;
        Ok(doc)
    })
    .await
    .map_err(|e| Error::Other(format!("extraction task failed: {}", e)))?
}

/// Builder for extracting and exporting documents.
///
/// # Example
///
/// ```no_run
/// use pdfstruct::{JsonFormat, Pdfstruct};
///
/// let json = Pdfstruct::new()
///     .sequential()
///     .without_features()
///     .extract("report.pdf")?
///     .to_json(JsonFormat::Compact)?;
/// # Ok::<(), pdfstruct::Error>(())
/// ```
pub struct Pdfstruct {
    options: ExtractOptions,
    detector: Option<Box<dyn LanguageDetector>>,
}

impl Pdfstruct {
    /// Create a new builder with default options.
    pub fn new() -> Self {
        Self {
            options: ExtractOptions::default(),
            detector: None,
        }
    }

    /// Replace all options at once.
    pub fn with_options(mut self, options: ExtractOptions) -> Self {
        self.options = options;
        self
    }

    /// Load options from a JSON configuration file.
    pub fn with_config_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        self.options = ExtractOptions::from_json_file(path)?;
        Ok(self)
    }

    /// Disable parallel page processing.
    pub fn sequential(mut self) -> Self {
        self.options = self.options.sequential();
        self
    }

    /// Skip vector chart detection and chart data extraction.
    pub fn without_charts(mut self) -> Self {
        self.options = self.options.without_charts();
        self
    }

    /// Skip per-block feature enrichment.
    pub fn without_features(mut self) -> Self {
        self.options = self.options.without_features();
        self
    }

    /// Keep column blocks separate instead of joining continuations.
    pub fn without_column_join(mut self) -> Self {
        self.options = self.options.with_column_join(false);
        self
    }

    /// Set how numerals are matched to footnotes.
    pub fn with_footnote_match(mut self, mode: FootnoteMatch) -> Self {
        self.options = self.options.with_footnote_match(mode);
        self
    }

    /// Use a custom language detector.
    pub fn with_detector(mut self, detector: Box<dyn LanguageDetector>) -> Self {
        self.detector = Some(detector);
        self
    }

    /// Extract a PDF file.
    pub fn extract<P: AsRef<Path>>(self, path: P) -> Result<PdfstructResult> {
        let source = PdfSource::open(path)?;
        Ok(self.run(&source))
    }

    /// Extract a PDF held in memory.
    pub fn extract_bytes(self, data: &[u8]) -> Result<PdfstructResult> {
        let source = PdfSource::from_bytes(data)?;
        Ok(self.run(&source))
    }

    /// Extract a JSON primitives dump.
    pub fn extract_primitives<P: AsRef<Path>>(self, path: P) -> Result<PdfstructResult> {
        let content = DocumentContent::from_json_file(path)?;
        Ok(self.run(&content))
    }

    /// Extract any document source.
    pub fn extract_source<D: DocumentSource + ?Sized>(self, source: &D) -> PdfstructResult {
        self.run(source)
    }

    fn run<D: DocumentSource + ?Sized>(self, source: &D) -> PdfstructResult {
        let assembler = match self.detector {
            Some(detector) => DocumentAssembler::with_detector(self.options, detector),
            None => DocumentAssembler::new(self.options),
        };
        PdfstructResult {
            document: assembler.assemble(source),
        }
    }
}

impl Default for Pdfstruct {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of extracting a document.
pub struct PdfstructResult {
    /// The reconstructed document
    pub document: Document,
}

impl PdfstructResult {
    /// Convert to the JSON artifact.
    pub fn to_json(&self, format: JsonFormat) -> Result<String> {
        render::to_json(&self.document, format)
    }

    /// Convert to the CSV export.
    pub fn to_csv(&self) -> Result<String> {
        render::to_csv_string(&self.document)
    }

    /// Get plain text in reading order.
    pub fn plain_text(&self) -> String {
        self.document.plain_text()
    }

    /// Get the document.
    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn into_document(self) -> Document {
        self.document
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Detection;
    use crate::source::RawRun;

    struct Always(&'static str);

    impl LanguageDetector for Always {
        fn detect(&self, _text: &str) -> Option<Detection> {
            Some(Detection {
                code: self.0.to_string(),
                confidence: 0.9,
            })
        }
    }

    fn make_content() -> DocumentContent {
        let mut page = PageContent::new(1, 600.0, 800.0);
        for i in 0..3 {
            let y = 100.0 + i as f32 * 14.0;
            page.runs.push(RawRun::new(
                "The survey covered households in every district of the province",
                BBox::new(50.0, y, 550.0, y + 11.0),
                11.0,
            ));
        }
        DocumentContent::new(vec![page])
    }

    // ==================== Builder Pattern Tests ====================

    #[test]
    fn test_builder_default() {
        let builder = Pdfstruct::default();
        assert_eq!(builder.options, ExtractOptions::default());
        assert!(builder.detector.is_none());
    }

    #[test]
    fn test_builder_chained() {
        let builder = Pdfstruct::new()
            .sequential()
            .without_charts()
            .without_features()
            .without_column_join()
            .with_footnote_match(FootnoteMatch::Substring);

        assert!(!builder.options.parallel);
        assert!(!builder.options.extract_charts);
        assert!(!builder.options.ml_features);
        assert!(!builder.options.join_columns);
        assert_eq!(builder.options.relationships.footnote_match, FootnoteMatch::Substring);
    }

    #[test]
    fn test_builder_with_detector() {
        let result = Pdfstruct::new()
            .with_detector(Box::new(Always("de")))
            .extract_source(&make_content());
        assert_eq!(result.document.metadata.primary_language, "de");
        assert_eq!(result.document().pages[0].content_blocks[0].language.code, "de");
    }

    #[test]
    fn test_builder_missing_config_file() {
        let result = Pdfstruct::new().with_config_file("/nonexistent/pdfstruct.json");
        assert!(result.is_err());
    }

    // ==================== Edge Case Tests ====================

    #[test]
    fn test_extract_bytes_empty_data() {
        let result = extract_bytes(&[]);
        assert!(matches!(result, Err(Error::UnknownFormat)));
    }

    #[test]
    fn test_extract_bytes_unknown_magic() {
        let data = b"<!DOCTYPE html><html></html>";
        assert!(matches!(extract_bytes(data), Err(Error::UnknownFormat)));
    }

    #[test]
    fn test_extract_bytes_truncated_pdf() {
        let result = Pdfstruct::new().extract_bytes(b"%PDF-1.7\n%garbage");
        assert!(result.is_err());
    }

    // ==================== Output Format Tests ====================

    #[test]
    fn test_result_exports() {
        let result = Pdfstruct::new().extract_source(&make_content());
        let json = result.to_json(JsonFormat::Compact).unwrap();
        assert!(json.starts_with("{\"document\":{"));

        let csv = result.to_csv().unwrap();
        assert!(csv.starts_with("data_type,id,page_number,type"));
        assert_eq!(csv.lines().count(), 1 + result.document.block_count());
        assert!(result.plain_text().contains("survey covered households"));
    }

    #[test]
    fn test_extract_source_matches_builder() {
        let content = make_content();
        let direct = extract_source(&content, ExtractOptions::default());
        let built = Pdfstruct::new().extract_source(&content).into_document();
        assert_eq!(direct, built);
    }
}
