//! Title and subtitle detection on paragraph lines.

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Kind of heading line found at the start of a paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleKind {
    Title,
    Subtitle,
}

/// Title detector configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TitleConfig {
    /// Font size over the column average that counts as large
    pub large_font_factor: f32,
    /// Maximum characters of a short line
    pub short_chars: usize,
    /// Maximum characters of a very short line
    pub very_short_chars: usize,
    /// Maximum words of a first line matched against title patterns
    pub first_line_max_words: usize,
    /// Maximum words of a standalone title-like phrase
    pub phrase_max_words: usize,
    /// More lowercase words than this make a line read like a sentence
    pub max_lowercase_words: usize,
}

impl Default for TitleConfig {
    fn default() -> Self {
        Self {
            large_font_factor: 1.1,
            short_chars: 100,
            very_short_chars: 60,
            first_line_max_words: 5,
            phrase_max_words: 4,
            max_lowercase_words: 2,
        }
    }
}

/// Decides whether a line is a title, a subtitle or neither.
pub struct TitleDetector {
    config: TitleConfig,
    exclusions: Vec<Regex>,
    patterns: Vec<Regex>,
    lowercase_word: Regex,
}

impl TitleDetector {
    pub fn new() -> Self {
        Self::with_config(TitleConfig::default())
    }

    pub fn with_config(config: TitleConfig) -> Self {
        let compile = |patterns: &[&str]| -> Vec<Regex> {
            patterns
                .iter()
                .map(|p| Regex::new(p).expect("valid regex"))
                .collect()
        };

        Self {
            config,
            exclusions: compile(&[
                r"(?i)^\d+\s+Cf\.",
                r"(?i)^Cf\.",
                r"(?i)^See\s+",
                r"(?i)^Source:",
                r"(?i)^Notes?:",
                r"(?i)^©\s*",
                r"(?i)^DOI:",
                r"(?i)^JEL:",
            ]),
            patterns: compile(&[
                r"(?i)^(Projection|Scenario|Box|Table|Figure|Section)\s+",
                r"(?i)^[A-Z][a-z]+(\s+[A-Z][a-z]+)+\s*:",
                r"(?i)^[A-Z][a-z]+\s+of\s+[A-Z]",
            ]),
            lowercase_word: Regex::new(r"\b[a-z]{3,}\b").expect("valid regex"),
        }
    }

    /// Classify a line.
    ///
    /// `avg_font_size` is the mean line font size of the column; `is_first`
    /// marks the first line of a paragraph.
    pub fn detect(&self, text: &str, font_size: f32, avg_font_size: f32, is_first: bool) -> Option<TitleKind> {
        let cfg = &self.config;
        let text = text.trim();
        let char_count = text.chars().count();
        if char_count < 3 {
            return None;
        }
        if self.exclusions.iter().any(|re| re.is_match(text)) {
            return None;
        }
        // Sentence endings; an ellipsis is allowed
        if text.ends_with(',') || (text.ends_with('.') && !text.ends_with("..")) {
            return None;
        }

        let words: Vec<&str> = text.split_whitespace().collect();
        let is_large_font = font_size > avg_font_size * cfg.large_font_factor;
        let is_short = char_count < cfg.short_chars;
        let is_very_short = char_count < cfg.very_short_chars;
        let ends_with_colon = text.ends_with(':');
        let is_all_caps = is_all_caps(text) && words.len() > 1;
        let first_words_caps = first_words_capitalized(&words);
        let many_lowercase = self.lowercase_word.find_iter(text).count() > cfg.max_lowercase_words;

        if ends_with_colon && is_short && (is_large_font || is_all_caps || first_words_caps) {
            return Some(TitleKind::Title);
        }

        if is_large_font && is_very_short && (is_all_caps || (first_words_caps && !many_lowercase)) {
            return Some(TitleKind::Title);
        }

        if is_very_short
            && first_words_caps
            && !many_lowercase
            && (ends_with_colon || (is_first && words.len() <= cfg.first_line_max_words))
        {
            if self.patterns.iter().any(|re| re.is_match(text)) {
                return Some(TitleKind::Title);
            }
            if words.len() <= cfg.phrase_max_words {
                return Some(TitleKind::Title);
            }
        }

        if ends_with_colon && is_short && first_words_caps && !many_lowercase {
            return Some(TitleKind::Subtitle);
        }

        if is_short && is_all_caps && is_first {
            return Some(TitleKind::Subtitle);
        }

        None
    }
}

impl Default for TitleDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// At least one cased letter and no lowercase letters.
pub(crate) fn is_all_caps(text: &str) -> bool {
    text.chars().any(|c| c.is_uppercase()) && !text.chars().any(|c| c.is_lowercase())
}

/// Most of the first three words start with a capital letter.
fn first_words_capitalized(words: &[&str]) -> bool {
    let head = &words[..words.len().min(3)];
    let capitalized = head
        .iter()
        .filter(|w| w.chars().next().is_some_and(|c| c.is_uppercase()))
        .count();
    !head.is_empty() && capitalized >= head.len().min(2)
}
