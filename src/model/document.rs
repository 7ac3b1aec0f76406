//! Document-level types.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Page, WritingSystem};
use crate::error::Result;

/// A reconstructed document: the root of the output tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Document metadata and language statistics
    pub metadata: Metadata,

    /// Pages in order
    pub pages: Vec<Page>,
}

impl Document {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self {
            metadata: Metadata::default(),
            pages: Vec::new(),
        }
    }

    /// Get the number of pages in the document.
    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    /// Get a page by number (1-indexed).
    pub fn get_page(&self, page_num: u32) -> Option<&Page> {
        if page_num == 0 {
            return None;
        }
        self.pages.get((page_num - 1) as usize)
    }

    /// Add a page to the document.
    pub fn add_page(&mut self, page: Page) {
        self.pages.push(page);
    }

    /// Total number of content blocks across pages.
    pub fn block_count(&self) -> usize {
        self.pages.iter().map(|p| p.content_blocks.len()).sum()
    }

    /// Get plain text content of the entire document.
    pub fn plain_text(&self) -> String {
        self.pages
            .iter()
            .map(|page| page.plain_text())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Write raster bytes of images and figures into `dir`.
    ///
    /// Files are named after the region id. Each written region gets its
    /// `file_path` set to `{prefix}{file name}`. Returns the number of files
    /// written.
    pub fn write_images(&mut self, dir: &Path, prefix: &str) -> Result<usize> {
        fs::create_dir_all(dir)?;
        let mut written = 0;

        for page in &mut self.pages {
            for image in &mut page.images {
                if image.data.is_empty() {
                    continue;
                }
                let name = format!("{}.{}", image.id, image.format);
                fs::write(dir.join(&name), &image.data)?;
                image.file_path = Some(format!("{}{}", prefix, name));
                written += 1;
            }
            for figure in &mut page.figures {
                if !figure.has_image_data() {
                    continue;
                }
                let ext = figure.format.as_deref().unwrap_or("bin");
                let name = format!("{}.{}", figure.id, ext);
                fs::write(dir.join(&name), &figure.data)?;
                figure.file_path = Some(format!("{}{}", prefix, name));
                written += 1;
            }
        }

        log::debug!("wrote {} image files to {}", written, dir.display());
        Ok(written)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Document metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Document title
    pub title: Option<String>,

    /// Document author
    pub author: Option<String>,

    /// Creation date
    pub creation_date: Option<DateTime<Utc>>,

    /// Last modification date
    pub modification_date: Option<DateTime<Utc>>,

    /// Total number of pages
    pub page_count: u32,

    /// File name of the input, when read from disk
    pub source_file: Option<String>,

    /// Languages of content blocks, most frequent first
    pub languages: Vec<LanguageShare>,

    /// Most frequent language code, or `unknown`
    pub primary_language: String,

    /// Writing systems of content blocks, most frequent first
    pub writing_systems: Vec<WritingSystemShare>,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            title: None,
            author: None,
            creation_date: None,
            modification_date: None,
            page_count: 0,
            source_file: None,
            languages: Vec::new(),
            primary_language: super::UNKNOWN_LANGUAGE.to_string(),
            writing_systems: Vec::new(),
        }
    }
}

/// Frequency of one language across the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageShare {
    pub code: String,
    pub name: String,
    pub frequency: usize,
    pub percentage: f32,
}

/// Frequency of one writing system across the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WritingSystemShare {
    pub system: WritingSystem,
    pub count: usize,
    pub percentage: f32,
}
