//! Text-type classification of block candidates.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::geometry::BBox;
use crate::model::Role;

/// Classifier configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Blocks starting above this y count as near the top of the page
    pub title_top: f32,
    pub title_size_ratio: f32,
    pub title_max_chars: usize,
    pub title_max_words: usize,
    /// Title indicators required out of four
    pub title_min_indicators: usize,

    pub heading_size_ratio: f32,
    pub heading_max_words: usize,
    pub subheading_size_ratio: f32,
    pub subheading_max_words: usize,
    pub minor_subheading_size_ratio: f32,
    pub minor_subheading_max_words: usize,

    pub caption_keywords: Vec<String>,
    /// Captions use fonts smaller than this...
    pub caption_max_font: f32,
    /// ...or start below this share of the page height
    pub caption_min_relative_y: f32,

    /// Fonts smaller than this are always footnotes
    pub footnote_font: f32,
    /// Fonts smaller than this are footnotes near the bottom or when numbered
    pub small_footnote_font: f32,
    pub footnote_min_relative_y: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            title_top: 150.0,
            title_size_ratio: 1.5,
            title_max_chars: 100,
            title_max_words: 15,
            title_min_indicators: 3,
            heading_size_ratio: 1.3,
            heading_max_words: 20,
            subheading_size_ratio: 1.1,
            subheading_max_words: 15,
            minor_subheading_size_ratio: 1.05,
            minor_subheading_max_words: 25,
            caption_keywords: ["Figure", "Fig.", "Table", "Chart", "Source:", "Note:"]
                .iter()
                .map(|k| k.to_string())
                .collect(),
            caption_max_font: 10.0,
            caption_min_relative_y: 0.85,
            footnote_font: 8.0,
            small_footnote_font: 9.0,
            footnote_min_relative_y: 0.9,
        }
    }
}

/// Assigns a [`Role`] from typography, position and text.
///
/// Classification depends only on its arguments; the page baseline font
/// size is passed in by the caller.
pub struct TextTypeClassifier {
    config: ClassifierConfig,
    author_patterns: Vec<Regex>,
    metadata_patterns: Vec<Regex>,
    leading_digit: Regex,
}

impl TextTypeClassifier {
    pub fn new() -> Self {
        Self::with_config(ClassifierConfig::default())
    }

    pub fn with_config(config: ClassifierConfig) -> Self {
        let re = |p: &str| Regex::new(p).expect("valid regex");
        Self {
            config,
            author_patterns: vec![
                // Only the keyword is case-insensitive; names must be capitalized
                re(r"^(?i:by)\s+[A-Z][a-z]+(?:\s+[A-Z]\.)?(?:\s+[A-Z][a-z]+)+"),
                re(r"^—\s*[A-Z][a-z]+(?:\s+[A-Z][a-z]+)*\s*—"),
                re(r"^(?i:author):\s*[A-Z]"),
            ],
            metadata_patterns: vec![
                re(r"(?i)^(Volume|Vol\.|ISSN|ISBN|Publisher|Editor|DOI:)"),
                re(r"^\d{4}"),
                re(r"(?i)^Page\s+\d+"),
            ],
            leading_digit: re(r"^\d"),
        }
    }

    /// Classify one block; the first matching rule wins.
    pub fn classify(
        &self,
        text: &str,
        font_size: f32,
        bold: bool,
        bbox: &BBox,
        page_height: f32,
        baseline_font_size: f32,
    ) -> Role {
        let cfg = &self.config;
        let text = text.trim();
        let words = text.split_whitespace().count();
        let size_ratio = if baseline_font_size > 0.0 {
            font_size / baseline_font_size
        } else {
            1.0
        };
        let relative_y = if page_height > 0.0 { bbox.y0 / page_height } else { 0.0 };

        let indicators = [
            bbox.y0 < cfg.title_top,
            size_ratio > cfg.title_size_ratio,
            bold,
            text.chars().count() < cfg.title_max_chars && words < cfg.title_max_words,
        ];
        if indicators.iter().filter(|&&hit| hit).count() >= cfg.title_min_indicators {
            return Role::Title;
        }

        if bold {
            if size_ratio > cfg.heading_size_ratio {
                if words < cfg.heading_max_words {
                    return Role::Heading;
                }
            } else if size_ratio > cfg.subheading_size_ratio && words < cfg.subheading_max_words {
                return Role::Subheading;
            }
            if size_ratio > cfg.minor_subheading_size_ratio && words < cfg.minor_subheading_max_words {
                return Role::Subheading;
            }
        }

        if self.author_patterns.iter().any(|re| re.is_match(text)) {
            return Role::Author;
        }

        if cfg.caption_keywords.iter().any(|k| text.contains(k.as_str()))
            && (font_size < cfg.caption_max_font || relative_y > cfg.caption_min_relative_y)
        {
            return Role::Caption;
        }

        if font_size < cfg.footnote_font {
            return Role::Footnote;
        }
        if font_size < cfg.small_footnote_font
            && (relative_y > cfg.footnote_min_relative_y || self.leading_digit.is_match(text))
        {
            return Role::Footnote;
        }

        if self.metadata_patterns.iter().any(|re| re.is_match(text)) {
            return Role::Metadata;
        }

        Role::Paragraph
    }
}

impl Default for TextTypeClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LONG: &str = "The central bank kept its policy rate unchanged for the third consecutive meeting this year";

    fn classify(text: &str, size: f32, bold: bool, y0: f32) -> Role {
        let bbox = BBox::new(50.0, y0, 500.0, y0 + size);
        TextTypeClassifier::new().classify(text, size, bold, &bbox, 800.0, 11.0)
    }

    #[test]
    fn test_title_from_four_indicators() {
        assert_eq!(classify("Economic Outlook 2024", 24.0, true, 50.0), Role::Title);
    }

    #[test]
    fn test_title_needs_three_indicators() {
        // short and near the top only
        assert_eq!(classify("Economic Outlook 2024", 11.0, false, 50.0), Role::Paragraph);
        // short, top, bold
        assert_eq!(classify("Economic Outlook 2024", 11.0, true, 50.0), Role::Title);
    }

    #[test]
    fn test_headings() {
        assert_eq!(classify("Monetary policy", 15.0, true, 400.0), Role::Heading);
        assert_eq!(classify("Monetary policy", 12.5, true, 400.0), Role::Subheading);
        assert_eq!(classify("Monetary policy", 15.0, false, 400.0), Role::Paragraph);
    }

    #[test]
    fn test_author() {
        assert_eq!(classify("By Jane Smith and colleagues at the institute", 11.0, false, 400.0), Role::Author);
        assert_eq!(classify("Author: Research Department of the Bank", 11.0, false, 400.0), Role::Author);
        assert_eq!(classify("BY Maria K. Lopez for the statistics office", 11.0, false, 400.0), Role::Author);
    }

    #[test]
    fn test_sentence_starting_with_by_is_not_author() {
        assert_eq!(
            classify("By contrast, inflation eased faster than expected in the second half", 11.0, false, 400.0),
            Role::Paragraph
        );
        assert_eq!(
            classify("By March the index had recovered most of its earlier losses", 11.0, false, 400.0),
            Role::Paragraph
        );
    }

    #[test]
    fn test_caption() {
        assert_eq!(classify("Table 1: Revenue by region and year", 9.0, false, 400.0), Role::Caption);
        assert_eq!(classify("Source: national statistics office data", 11.0, false, 700.0), Role::Caption);
        assert_eq!(classify("Table 1 shows revenue growth across the regions", 11.0, false, 400.0), Role::Paragraph);
    }

    #[test]
    fn test_footnotes() {
        assert_eq!(classify(LONG, 7.5, false, 400.0), Role::Footnote);
        assert_eq!(classify("3 See the annual report for details of the method", 8.5, false, 400.0), Role::Footnote);
        assert_eq!(classify(LONG, 8.5, false, 740.0), Role::Footnote);
        assert_eq!(classify(LONG, 8.5, false, 400.0), Role::Paragraph);
    }

    #[test]
    fn test_metadata() {
        assert_eq!(classify("ISSN 1234-5678 and further bibliographic information", 11.0, false, 400.0), Role::Metadata);
        assert_eq!(classify("2024 edition of the report for all member states", 11.0, false, 400.0), Role::Metadata);
        assert_eq!(classify("Page 4 of the appendix continues with more tables", 11.0, false, 400.0), Role::Metadata);
    }

    #[test]
    fn test_default_paragraph() {
        assert_eq!(classify(LONG, 11.0, false, 400.0), Role::Paragraph);
    }
}
