//! In-memory page primitives.
//!
//! These are the records every input adapter produces. They also
//! (de)serialize as a JSON "primitives dump", which lets the pipeline run on
//! output from any external PDF toolkit.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{DocumentSource, PageSource};
use crate::error::{Error, Result};
use crate::geometry::BBox;

/// A positioned run of text as reported by the parser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRun {
    pub text: String,
    pub bbox: BBox,
    pub font_size: f32,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub font_name: Option<String>,
}

impl RawRun {
    pub fn new(text: impl Into<String>, bbox: BBox, font_size: f32) -> Self {
        Self {
            text: text.into(),
            bbox,
            font_size,
            bold: false,
            italic: false,
            font_name: None,
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }
}

/// A straight segment from the page's vector drawing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineSegment {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl LineSegment {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn dx(&self) -> f32 {
        (self.x1 - self.x0).abs()
    }

    pub fn dy(&self) -> f32 {
        (self.y1 - self.y0).abs()
    }

    pub fn length(&self) -> f32 {
        self.dx().hypot(self.dy())
    }

    pub fn bbox(&self) -> BBox {
        BBox::new(self.x0, self.y0, self.x1, self.y1)
    }
}

/// A curved path, reduced to its control and end points.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Curve {
    pub points: Vec<(f32, f32)>,
}

impl Curve {
    /// Bounding box of all points, if there are any.
    pub fn bbox(&self) -> Option<BBox> {
        let (first, rest) = self.points.split_first()?;
        let mut bbox = BBox::new(first.0, first.1, first.0, first.1);
        for &(x, y) in rest {
            bbox = bbox.union(&BBox::new(x, y, x, y));
        }
        Some(bbox)
    }
}

/// Vector geometry of a page.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VectorPrimitives {
    pub lines: Vec<LineSegment>,
    pub curves: Vec<Curve>,
}

impl VectorPrimitives {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() && self.curves.is_empty()
    }
}

/// An embedded raster image and where it is drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagePlacement {
    pub bbox: BBox,
    /// File extension of `data` (`jpeg`, `jp2`, `raw`, ...)
    pub format: String,
    #[serde(default)]
    pub data: Vec<u8>,
}

/// A cell grid produced by a dedicated table extraction tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableGrid {
    pub bbox: BBox,
    pub rows: Vec<Vec<String>>,
}

/// All primitives of one page.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PageContent {
    /// Page number (1-indexed)
    pub number: u32,
    pub width: f32,
    pub height: f32,
    #[serde(default)]
    pub runs: Vec<RawRun>,
    #[serde(default)]
    pub lines: Vec<LineSegment>,
    #[serde(default)]
    pub curves: Vec<Curve>,
    #[serde(default)]
    pub images: Vec<ImagePlacement>,
    #[serde(default)]
    pub table_grids: Vec<TableGrid>,
}

impl PageContent {
    pub fn new(number: u32, width: f32, height: f32) -> Self {
        Self {
            number,
            width,
            height,
            ..Default::default()
        }
    }
}

impl PageSource for PageContent {
    fn page_number(&self) -> u32 {
        self.number
    }

    fn size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    fn text_runs(&self) -> Vec<RawRun> {
        self.runs.clone()
    }

    fn vector_primitives(&self) -> VectorPrimitives {
        VectorPrimitives {
            lines: self.lines.clone(),
            curves: self.curves.clone(),
        }
    }

    fn images(&self) -> Vec<ImagePlacement> {
        self.images.clone()
    }

    fn table_grids(&self) -> Vec<TableGrid> {
        self.table_grids.clone()
    }
}

/// Document information reported by an input adapter.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SourceMetadata {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub creation_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub modification_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub source_file: Option<String>,
}

/// A whole document held in memory.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DocumentContent {
    #[serde(default)]
    pub metadata: SourceMetadata,
    pub pages: Vec<PageContent>,
}

impl DocumentContent {
    pub fn new(pages: Vec<PageContent>) -> Self {
        Self {
            metadata: SourceMetadata::default(),
            pages,
        }
    }

    /// Parse a primitives dump from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let mut content: DocumentContent = serde_json::from_str(json)?;
        content.validate()?;
        Ok(content)
    }

    /// Load a primitives dump from disk.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)?;
        let mut content = Self::from_json_str(&json)?;
        if content.metadata.source_file.is_none() {
            content.metadata.source_file = path
                .file_name()
                .map(|name| name.to_string_lossy().to_string());
        }
        Ok(content)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Render(e.to_string()))
    }

    /// Number pages sequentially when the dump leaves them at zero, and
    /// reject pages without a usable size.
    fn validate(&mut self) -> Result<()> {
        for (idx, page) in self.pages.iter_mut().enumerate() {
            if page.number == 0 {
                page.number = idx as u32 + 1;
            }
            if !(page.width > 0.0 && page.height > 0.0) {
                return Err(Error::InvalidSource(format!(
                    "page {} has invalid size {}x{}",
                    page.number, page.width, page.height
                )));
            }
        }
        Ok(())
    }
}

impl DocumentSource for DocumentContent {
    fn metadata(&self) -> SourceMetadata {
        self.metadata.clone()
    }

    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn page(&self, number: u32) -> Result<PageContent> {
        if number == 0 {
            return Err(Error::PageOutOfRange(number, self.page_count()));
        }
        self.pages
            .get((number - 1) as usize)
            .cloned()
            .ok_or(Error::PageOutOfRange(number, self.page_count()))
    }
}
