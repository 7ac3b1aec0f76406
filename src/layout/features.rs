//! Per-block feature vectors.

use regex::Regex;

use crate::model::{Alignment, ContentBlock, FontWeight, MlFeatures, Page, Role, WritingSystem};

/// Horizontal positions are normalized by this nominal page width.
const NOMINAL_WIDTH: f32 = 600.0;

fn round4(value: f32) -> f32 {
    (value * 10_000.0).round() / 10_000.0
}

/// Computes [`MlFeatures`] for every block of a page.
pub struct FeatureExtractor {
    sentence_end: Regex,
    digit: Regex,
    special: Regex,
    capitalized: Regex,
    terminal: Regex,
}

impl FeatureExtractor {
    pub fn new() -> Self {
        let re = |p: &str| Regex::new(p).expect("valid regex");
        Self {
            sentence_end: re(r"[.!?]+"),
            digit: re(r"\d"),
            special: re(r"[^\w\s]"),
            capitalized: re(r"\b[A-Z][a-z]+\b"),
            terminal: re(r"[.!?]$"),
        }
    }

    /// Attach features to every block of `page`.
    pub fn enrich(&self, page: &mut Page, total_pages: u32) {
        let features: Vec<MlFeatures> = page
            .content_blocks
            .iter()
            .map(|block| self.compute(block, page, total_pages))
            .collect();
        for (block, features) in page.content_blocks.iter_mut().zip(features) {
            block.ml_features = Some(features);
        }
    }

    fn compute(&self, block: &ContentBlock, page: &Page, total_pages: u32) -> MlFeatures {
        let text = block.content.as_str();
        let words: Vec<&str> = text.split_whitespace().collect();
        let word_count = words.len();
        let word_chars: usize = words.iter().map(|w| w.chars().count()).sum();

        let pos = &block.position;
        let height = page.height();
        let by_height = |y: f32| if height > 0.0 { round4(y / height) } else { 0.0 };
        let center_x = (pos.x0 + pos.x1) / 2.0 / NOMINAL_WIDTH;

        let page_number = page.page_number;
        let mut features = MlFeatures {
            char_count: text.chars().count(),
            word_count,
            sentence_count: self.sentence_end.find_iter(text).count(),
            token_count: word_count,
            avg_word_length: round4(word_chars as f32 / word_count.max(1) as f32),
            has_numbers: self.digit.is_match(text),
            has_special_chars: self.special.is_match(text),
            has_capitalized_words: self.capitalized.is_match(text),
            ends_with_punctuation: self.terminal.is_match(text.trim()),

            normalized_x0: round4(pos.x0 / NOMINAL_WIDTH),
            normalized_y0: by_height(pos.y0),
            normalized_x1: round4(pos.x1 / NOMINAL_WIDTH),
            normalized_y1: by_height(pos.y1),
            normalized_center_x: round4(center_x),
            normalized_center_y: by_height((pos.y0 + pos.y1) / 2.0),
            relative_to_page_center: round4((center_x - 0.5).abs()),

            page_number,
            relative_page_position: round4(page_number as f32 / total_pages.max(1) as f32),
            is_first_page: page_number == 1,
            is_last_page: page_number == total_pages,

            font_size: block.styling.font_size.unwrap_or(0.0),
            font_weight_bold: u8::from(block.styling.font_weight == FontWeight::Bold),
            alignment_left: u8::from(block.styling.alignment == Alignment::Left),
            alignment_center: u8::from(block.styling.alignment == Alignment::Center),
            alignment_right: u8::from(block.styling.alignment == Alignment::Right),

            hierarchy_level: block.hierarchy_level,
            is_title: u8::from(block.text_type == Role::Title),
            is_heading: u8::from(matches!(block.text_type, Role::Heading | Role::Subheading)),
            is_paragraph: u8::from(block.text_type == Role::Paragraph),

            has_table: u8::from(block.relationships.table_id.is_some()),
            has_figure: u8::from(block.relationships.figure_id.is_some()),
            has_footnotes: u8::from(!block.relationships.footnote_ids.is_empty()),
            footnote_count: block.relationships.footnote_ids.len(),

            language_code: block.language.code.clone(),
            language_confidence: block.language.confidence,
            writing_system_ltr: u8::from(block.language.writing_system == WritingSystem::Ltr),
            writing_system_rtl: u8::from(block.language.writing_system == WritingSystem::Rtl),

            ..Default::default()
        };

        // Neighbours by vertical position
        let previous = page
            .content_blocks
            .iter()
            .filter(|b| b.position.y0 < pos.y0)
            .max_by(|a, b| a.position.y0.total_cmp(&b.position.y0));
        if let Some(prev) = previous {
            features.previous_block_type = Some(prev.text_type);
            features.previous_block_hierarchy = Some(prev.hierarchy_level);
            features.distance_to_previous = Some(round4(pos.y0 - prev.position.y1));
        }
        let next = page
            .content_blocks
            .iter()
            .filter(|b| b.position.y0 > pos.y0)
            .min_by(|a, b| a.position.y0.total_cmp(&b.position.y0));
        if let Some(next) = next {
            features.next_block_type = Some(next.text_type);
            features.next_block_hierarchy = Some(next.hierarchy_level);
            features.distance_to_next = Some(round4(next.position.y0 - pos.y1));
        }

        if let Some(parent) = &block.parent_id {
            let mut siblings: Vec<&ContentBlock> = page
                .content_blocks
                .iter()
                .filter(|b| b.parent_id.as_ref() == Some(parent))
                .collect();
            siblings.sort_by(|a, b| a.position.y0.total_cmp(&b.position.y0));
            let index = siblings.iter().position(|b| b.id == block.id).unwrap_or(0);
            features.section_block_count = siblings.len();
            features.section_position = round4(index as f32 / siblings.len().max(1) as f32);
        }

        features
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}
