//! Input ports.
//!
//! The layout pipeline never touches a PDF library directly. It reads pages
//! through [`DocumentSource`] and [`PageSource`]; a capability a source
//! cannot provide (vector geometry, images, cell grids) is simply reported
//! as empty.

mod content;
mod pdf;

pub use content::{
    Curve, DocumentContent, ImagePlacement, LineSegment, PageContent, RawRun, SourceMetadata,
    TableGrid, VectorPrimitives,
};
pub use pdf::PdfSource;

use crate::error::Result;

/// Primitives of a single page.
pub trait PageSource {
    /// Page number (1-indexed).
    fn page_number(&self) -> u32;

    /// Page `(width, height)` in points.
    fn size(&self) -> (f32, f32);

    /// Positioned text runs, top-left origin.
    fn text_runs(&self) -> Vec<RawRun>;

    fn vector_primitives(&self) -> VectorPrimitives {
        VectorPrimitives::default()
    }

    fn images(&self) -> Vec<ImagePlacement> {
        Vec::new()
    }

    /// Cell grids from a dedicated table extractor.
    fn table_grids(&self) -> Vec<TableGrid> {
        Vec::new()
    }
}

/// A document that can hand out its pages independently.
///
/// Implementations must be shareable across threads so pages can be
/// processed in parallel.
pub trait DocumentSource: Sync {
    fn metadata(&self) -> SourceMetadata;

    fn page_count(&self) -> u32;

    /// Read one page (1-indexed).
    fn page(&self, number: u32) -> Result<PageContent>;
}
