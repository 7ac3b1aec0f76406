//! Page-level types.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::{ContentBlock, Figure, Image, Table};

/// Page size in points.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f32,
    pub height: f32,
}

/// A single reconstructed page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Page number (1-indexed)
    pub page_number: u32,

    pub dimensions: Dimensions,

    /// Text blocks in reading order
    pub content_blocks: Vec<ContentBlock>,

    pub tables: Vec<Table>,

    pub images: Vec<Image>,

    pub figures: Vec<Figure>,
}

impl Page {
    /// Create a new empty page with the given dimensions.
    pub fn new(page_number: u32, width: f32, height: f32) -> Self {
        Self {
            page_number,
            dimensions: Dimensions { width, height },
            content_blocks: Vec::new(),
            tables: Vec::new(),
            images: Vec::new(),
            figures: Vec::new(),
        }
    }

    pub fn width(&self) -> f32 {
        self.dimensions.width
    }

    pub fn height(&self) -> f32 {
        self.dimensions.height
    }

    /// Check if the page has no blocks and no regions.
    pub fn is_empty(&self) -> bool {
        self.content_blocks.is_empty()
            && self.tables.is_empty()
            && self.images.is_empty()
            && self.figures.is_empty()
    }

    /// Look up a block by id.
    pub fn block(&self, id: &str) -> Option<&ContentBlock> {
        self.content_blocks.iter().find(|b| b.id == id)
    }

    /// Ids of every block and region on the page.
    pub fn known_ids(&self) -> HashSet<&str> {
        self.content_blocks
            .iter()
            .map(|b| b.id.as_str())
            .chain(self.tables.iter().map(|t| t.id.as_str()))
            .chain(self.images.iter().map(|i| i.id.as_str()))
            .chain(self.figures.iter().map(|f| f.id.as_str()))
            .collect()
    }

    /// Plain text of all blocks in reading order.
    pub fn plain_text(&self) -> String {
        self.content_blocks
            .iter()
            .map(|b| b.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
