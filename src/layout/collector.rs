//! Run collection: raw parser runs to a uniform, page-clamped record set.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use crate::geometry::BBox;
use crate::source::RawRun;

/// Fallback baseline font size for pages without text.
pub const DEFAULT_BASELINE_FONT_SIZE: f32 = 12.0;

/// Run collector configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Apply Unicode NFC normalization to run text
    pub normalize_unicode: bool,
    /// Runs with a font size at or below this are dropped
    pub min_font_size: f32,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            normalize_unicode: true,
            min_font_size: 0.0,
        }
    }
}

/// A normalized text run. Immutable once collected.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub bbox: BBox,
    pub font_size: f32,
    pub bold: bool,
    pub italic: bool,
    /// Position of the run in the parser's output order
    pub order: usize,
}

impl TextRun {
    pub fn new(text: impl Into<String>, bbox: BBox, font_size: f32) -> Self {
        Self {
            text: text.into(),
            bbox,
            font_size,
            bold: false,
            italic: false,
            order: 0,
        }
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// Font size frequencies of one page, in 0.1pt buckets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FontHistogram {
    buckets: HashMap<i32, usize>,
}

impl FontHistogram {
    pub fn add(&mut self, size: f32) {
        let key = (size * 10.0).round() as i32;
        *self.buckets.entry(key).or_insert(0) += 1;
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Most common font size; ties go to the smaller size.
    pub fn mode(&self) -> f32 {
        self.buckets
            .iter()
            .max_by(|(ka, ca), (kb, cb)| ca.cmp(cb).then_with(|| kb.cmp(ka)))
            .map(|(key, _)| *key as f32 / 10.0)
            .unwrap_or(DEFAULT_BASELINE_FONT_SIZE)
    }

    pub fn merge(&mut self, other: &FontHistogram) {
        for (key, count) in &other.buckets {
            *self.buckets.entry(*key).or_insert(0) += count;
        }
    }
}

/// Normalizes raw runs of one page.
pub struct RunCollector {
    config: CollectorConfig,
}

impl RunCollector {
    pub fn new() -> Self {
        Self::with_config(CollectorConfig::default())
    }

    pub fn with_config(config: CollectorConfig) -> Self {
        Self { config }
    }

    /// Normalize runs and build the page font histogram.
    ///
    /// Empty runs and runs without a positive font size are dropped; boxes
    /// are clamped to the page.
    pub fn collect(&self, raw: Vec<RawRun>, width: f32, height: f32) -> (Vec<TextRun>, FontHistogram) {
        let mut histogram = FontHistogram::default();
        let mut runs = Vec::with_capacity(raw.len());

        for run in raw {
            if !(run.font_size > self.config.min_font_size.max(0.0)) {
                continue;
            }
            let text = if self.config.normalize_unicode {
                run.text.nfc().collect::<String>()
            } else {
                run.text
            };
            let text = text.trim();
            if text.is_empty() {
                continue;
            }

            histogram.add(run.font_size);
            runs.push(TextRun {
                text: text.to_string(),
                bbox: run.bbox.clamp(width, height),
                font_size: run.font_size,
                bold: run.bold,
                italic: run.italic,
                order: runs.len(),
            });
        }

        log::debug!(
            "RunCollector: kept {} runs, baseline font {:.1}",
            runs.len(),
            histogram.mode()
        );
        (runs, histogram)
    }
}

impl Default for RunCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_raw(text: &str, x0: f32, y0: f32, size: f32) -> RawRun {
        RawRun::new(text, BBox::new(x0, y0, x0 + 50.0, y0 + size), size)
    }

    #[test]
    fn test_collect_filters_and_clamps() {
        let raw = vec![
            make_raw("  Hello ", 10.0, 10.0, 11.0),
            make_raw("   ", 10.0, 30.0, 11.0),
            make_raw("zero", 10.0, 50.0, 0.0),
            make_raw("edge", 580.0, 790.0, 11.0),
        ];
        let (runs, histogram) = RunCollector::new().collect(raw, 600.0, 800.0);

        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].text, "Hello");
        assert_eq!(runs[1].bbox.x1, 600.0);
        assert_eq!(runs[1].bbox.y1, 800.0);
        assert_eq!(runs[1].order, 1);
        assert_eq!(histogram.mode(), 11.0);
    }

    #[test]
    fn test_nfc_normalization() {
        // "e" followed by a combining acute accent
        let raw = vec![make_raw("Caf\u{0065}\u{0301}", 0.0, 0.0, 10.0)];
        let (runs, _) = RunCollector::new().collect(raw, 600.0, 800.0);
        assert_eq!(runs[0].text, "Caf\u{00E9}");
    }

    #[test]
    fn test_histogram_mode() {
        let mut histogram = FontHistogram::default();
        assert_eq!(histogram.mode(), DEFAULT_BASELINE_FONT_SIZE);

        for size in [10.0, 10.0, 11.0, 11.0, 24.0] {
            histogram.add(size);
        }
        // tie between 10 and 11 resolves to the smaller size
        assert_eq!(histogram.mode(), 10.0);

        histogram.add(11.04);
        assert_eq!(histogram.mode(), 11.0);
    }
}
