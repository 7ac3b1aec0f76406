//! Per-block feature vectors for downstream model training.

use serde::{Deserialize, Serialize};

use super::Role;

/// Numeric and categorical features describing one content block.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MlFeatures {
    // Text statistics
    pub char_count: usize,
    pub word_count: usize,
    pub sentence_count: usize,
    pub token_count: usize,
    pub avg_word_length: f32,
    pub has_numbers: bool,
    pub has_special_chars: bool,
    pub has_capitalized_words: bool,
    pub ends_with_punctuation: bool,

    // Position, x normalized by a nominal 600-unit width and y by page height
    pub normalized_x0: f32,
    pub normalized_y0: f32,
    pub normalized_x1: f32,
    pub normalized_y1: f32,
    pub normalized_center_x: f32,
    pub normalized_center_y: f32,
    pub relative_to_page_center: f32,

    // Document position
    pub page_number: u32,
    pub relative_page_position: f32,
    pub is_first_page: bool,
    pub is_last_page: bool,

    // Neighbours by vertical position
    pub previous_block_type: Option<Role>,
    pub previous_block_hierarchy: Option<u8>,
    pub distance_to_previous: Option<f32>,
    pub next_block_type: Option<Role>,
    pub next_block_hierarchy: Option<u8>,
    pub distance_to_next: Option<f32>,

    // Section context
    pub section_block_count: usize,
    pub section_position: f32,

    // Styling
    pub font_size: f32,
    pub font_weight_bold: u8,
    pub alignment_left: u8,
    pub alignment_center: u8,
    pub alignment_right: u8,

    // Hierarchy
    pub hierarchy_level: u8,
    pub is_title: u8,
    pub is_heading: u8,
    pub is_paragraph: u8,

    // Relationships
    pub has_table: u8,
    pub has_figure: u8,
    pub has_footnotes: u8,
    pub footnote_count: usize,

    // Language
    pub language_code: String,
    pub language_confidence: f32,
    pub writing_system_ltr: u8,
    pub writing_system_rtl: u8,
}
