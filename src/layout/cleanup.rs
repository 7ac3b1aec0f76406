//! Paragraph text cleanup and discard checks.

use regex::Regex;

/// Leading words that mark a paragraph starting in the middle of a word.
const WORD_FRAGMENTS: &[&str] = &[
    "tion", "ing", "ed", "er", "ly", "al", "ic", "ous", "ment", "ness", "ity", "ive", "able", "ible",
];

/// Cleans paragraph text and flags lines and paragraphs that are not prose.
pub struct TextCleaner {
    hyphen_break: Regex,
    invisible: Regex,
    issue_number: Regex,
    figure_ref: Regex,
    footnote_after_period: Regex,
    footnote_after_word: Regex,
    axis_numbers: Regex,
    abbreviation_run: Regex,
    whitespace: Regex,

    metadata: Vec<Regex>,
    numbers_only: Regex,
    abbreviations_only: Regex,
    label: Regex,
    noise: Regex,
}

impl TextCleaner {
    pub fn new() -> Self {
        let re = |p: &str| Regex::new(p).expect("valid regex");
        Self {
            hyphen_break: re(r"([a-z])-\s+([a-z])"),
            invisible: re("[\u{00AD}\u{200B}\u{200C}\u{200D}\u{FEFF}]"),
            issue_number: re(r"\d+/\d{4}"),
            figure_ref: re(r"Figure\s+\d+"),
            footnote_after_period: re(r"\.(\d+)\s+([A-Z])"),
            footnote_after_word: re(r"([a-z])\.(\d+)\s+([A-Z][a-z]+)"),
            axis_numbers: re(r"\b\d+\s+\d+\s+\d+\s+\d+\b"),
            abbreviation_run: re(r"\b[A-Z]{1,4}(\s+[A-Z]{1,4}){2,15}\b"),
            whitespace: re(r"\s+"),

            metadata: [
                r"^(?i)(Figure|Table|Box)\s+\d+",
                r"^(?i)Source:",
                r"^(?i)Notes?:",
                r"^©",
                r"^(?i)DOI:",
                r"^(?i)JEL:",
                r"^(?i)Keywords?:",
                r"^(?i)ISSN",
                r"^(?i)Volume\s+\d+",
                r"^(?i)In\s+percent",
                r"^\d+$",
            ]
            .iter()
            .map(|p| re(p))
            .collect(),
            numbers_only: re(r"^[\d\s]{5,}$"),
            abbreviations_only: re(r"^[A-Z]{1,4}(\s+[A-Z]{1,4}){2,15}$"),
            label: re(r"^[A-Z][a-z]+\s+[A-Z][a-z]+(\s+[A-Z][a-z]+){0,2}$"),
            noise: re(r"^[\d\sA-Z]{0,30}$"),
        }
    }

    /// Clean the joined body text of a paragraph.
    pub fn clean(&self, text: &str) -> String {
        let text = self.invisible.replace_all(text, "");
        let text = self.hyphen_break.replace_all(&text, "$1$2");
        let text = self.whitespace.replace_all(&text, " ");

        let text = self.issue_number.replace_all(&text, "");
        let text = self.figure_ref.replace_all(&text, "");
        let text = self.footnote_after_period.replace_all(&text, ". $2");
        let text = self.footnote_after_word.replace_all(&text, "$1. $3");

        let text = self.axis_numbers.replace_all(&text, "");
        let text = self.abbreviation_run.replace_all(&text, "");

        self.whitespace.replace_all(&text, " ").trim().to_string()
    }

    /// Whether a single line is a label, marker or other non-prose line.
    pub fn is_metadata_line(&self, text: &str) -> bool {
        let text = text.trim();
        if text.chars().count() < 2 {
            return false;
        }
        if self.numbers_only.is_match(text) || self.abbreviations_only.is_match(text) {
            return true;
        }
        if self.label.is_match(text) && text.len() < 50 && text.split_whitespace().count() <= 3 {
            return true;
        }
        self.metadata.iter().any(|re| re.is_match(text))
    }

    /// Only digits, whitespace and capitals: axis ticks, chart codes.
    pub fn is_noise(&self, text: &str) -> bool {
        self.noise.is_match(text)
    }

    /// Whether the first word is a known word-ending fragment.
    pub fn starts_with_fragment(&self, text: &str) -> bool {
        text.split_whitespace()
            .next()
            .map(|word| WORD_FRAGMENTS.contains(&word.to_lowercase().as_str()))
            .unwrap_or(false)
    }
}

impl Default for TextCleaner {
    fn default() -> Self {
        Self::new()
    }
}
