//! Removal of runs that belong to tables, charts and images.

use serde::{Deserialize, Serialize};

use crate::geometry::BBox;
use crate::layout::collector::TextRun;

/// Exclusion filter configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExclusionConfig {
    /// A run is excluded when more than this share of its area lies inside a region
    pub overlap_threshold: f32,
}

impl Default for ExclusionConfig {
    fn default() -> Self {
        Self {
            overlap_threshold: 0.5,
        }
    }
}

/// Whether a run box is covered by any region beyond `threshold`.
pub fn is_excluded(bbox: &BBox, regions: &[BBox], threshold: f32) -> bool {
    regions.iter().any(|region| bbox.coverage_by(region) > threshold)
}

/// Split runs into flow text and region content.
///
/// Returns `(kept, excluded)`; both keep their input order.
pub fn filter_runs(runs: Vec<TextRun>, regions: &[BBox], config: &ExclusionConfig) -> (Vec<TextRun>, Vec<TextRun>) {
    if regions.is_empty() {
        return (runs, Vec::new());
    }
    let (excluded, kept): (Vec<_>, Vec<_>) = runs
        .into_iter()
        .partition(|run| is_excluded(&run.bbox, regions, config.overlap_threshold));

    log::debug!(
        "Exclusion: {} runs kept, {} inside {} regions",
        kept.len(),
        excluded.len(),
        regions.len()
    );
    (kept, excluded)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_run(text: &str, x0: f32, y0: f32, x1: f32, y1: f32) -> TextRun {
        TextRun::new(text, BBox::new(x0, y0, x1, y1), 10.0)
    }

    #[test]
    fn test_coverage_threshold() {
        let region = BBox::new(0.0, 0.0, 100.0, 100.0);
        // 60% inside
        assert!(is_excluded(&BBox::new(40.0, 0.0, 140.0, 10.0), &[region], 0.5));
        // 40% inside
        assert!(!is_excluded(&BBox::new(60.0, 0.0, 160.0, 10.0), &[region], 0.5));
        assert!(!is_excluded(&BBox::new(40.0, 0.0, 140.0, 10.0), &[], 0.5));
    }

    #[test]
    fn test_filter_runs_keeps_order() {
        let regions = [BBox::new(0.0, 100.0, 600.0, 300.0)];
        let runs = vec![
            make_run("before", 10.0, 50.0, 100.0, 60.0),
            make_run("cell", 10.0, 150.0, 60.0, 160.0),
            make_run("after", 10.0, 350.0, 100.0, 360.0),
        ];
        let (kept, excluded) = filter_runs(runs, &regions, &ExclusionConfig::default());

        let kept: Vec<_> = kept.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(kept, vec!["before", "after"]);
        assert_eq!(excluded.len(), 1);
        assert_eq!(excluded[0].text, "cell");
    }
}
