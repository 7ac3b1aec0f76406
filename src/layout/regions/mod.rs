//! Detection of non-flowing regions: tables, charts and images.

mod chart;
mod image;
mod table;

pub use chart::{ChartCandidate, ChartDetector, ChartDetectorConfig};
pub use image::{embedded_text, ImageClassifier, ImageClassifierConfig};
pub use table::{TableDetector, TableDetectorConfig};

use std::cmp::Ordering;

use crate::geometry::BBox;

/// Keep the largest candidates and drop any box overlapping an already
/// accepted one by `threshold` or more (intersection over the smaller area).
pub fn dedup_regions(mut candidates: Vec<BBox>, threshold: f32) -> Vec<BBox> {
    candidates.sort_by(|a, b| b.area().partial_cmp(&a.area()).unwrap_or(Ordering::Equal));

    let mut accepted: Vec<BBox> = Vec::new();
    for candidate in candidates {
        if accepted
            .iter()
            .all(|region| candidate.overlap_ratio_min(region) < threshold)
        {
            accepted.push(candidate);
        }
    }
    accepted
}

/// Whether `bbox` overlaps any of `regions` by `threshold` or more.
pub fn overlaps_any(bbox: &BBox, regions: &[BBox], threshold: f32) -> bool {
    regions
        .iter()
        .any(|region| bbox.overlap_ratio_min(region) >= threshold)
}

/// Greedy 1-D clustering of sorted values: a value joins the current
/// cluster when it lies within `tolerance` of the previous value.
pub(crate) fn chain_clusters(values: &[f32], tolerance: f32) -> Vec<Vec<f32>> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    let mut clusters: Vec<Vec<f32>> = Vec::new();
    for value in sorted {
        match clusters.last_mut() {
            Some(cluster) if cluster.last().is_some_and(|last| value - last < tolerance) => {
                cluster.push(value)
            }
            _ => clusters.push(vec![value]),
        }
    }
    clusters
}

pub(crate) fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f32>() / values.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_prefers_larger_regions() {
        let big = BBox::new(0.0, 0.0, 200.0, 200.0);
        let inner = BBox::new(10.0, 10.0, 60.0, 60.0);
        let apart = BBox::new(300.0, 300.0, 400.0, 400.0);

        let accepted = dedup_regions(vec![inner, apart, big], 0.5);
        assert_eq!(accepted, vec![big, apart]);
    }

    #[test]
    fn test_dedup_result_respects_threshold() {
        let candidates: Vec<BBox> = (0..20)
            .map(|i| {
                let x = i as f32 * 15.0;
                BBox::new(x, 0.0, x + 60.0 + i as f32, 60.0)
            })
            .collect();
        let accepted = dedup_regions(candidates, 0.3);

        for (i, a) in accepted.iter().enumerate() {
            for b in accepted.iter().skip(i + 1) {
                assert!(a.overlap_ratio_min(b) < 0.3);
            }
        }
    }

    #[test]
    fn test_chain_clusters() {
        let clusters = chain_clusters(&[100.0, 12.0, 10.0, 103.0, 14.0, 50.0], 5.0);
        assert_eq!(clusters, vec![vec![10.0, 12.0, 14.0], vec![50.0], vec![100.0, 103.0]]);
    }
}
