//! Column segmentation.
//!
//! Column boundaries are placed in wide gaps between the left edges of text
//! segments. Only runs that start a segment count: a run directly continuing
//! another run on the same line says nothing about where columns begin.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::layout::collector::TextRun;

/// Column segmenter configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnConfig {
    /// Lower bound of the boundary gap threshold
    pub min_gap: f32,
    /// Share of the largest gap used as boundary threshold
    pub gap_ratio: f32,
    /// A run continues its left neighbour when the gap is below this many font sizes
    pub segment_gap_factor: f32,
    /// A column must hold segment starts on at least this many lines
    pub min_column_lines: usize,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            min_gap: 50.0,
            gap_ratio: 0.3,
            segment_gap_factor: 0.6,
            min_column_lines: 2,
        }
    }
}

/// Partition runs into columns, leftmost first.
///
/// Every column is sorted top-to-bottom, then left-to-right. Empty columns
/// are not returned.
pub fn segment_columns(runs: Vec<TextRun>, config: &ColumnConfig) -> Vec<Vec<TextRun>> {
    if runs.is_empty() {
        return Vec::new();
    }

    let starts = segment_starts(&runs, config);
    let boundaries = column_boundaries(&starts, config);

    let mut columns: Vec<Vec<TextRun>> = vec![Vec::new(); boundaries.len() + 1];
    for run in runs {
        let (center_x, _) = run.bbox.center();
        let index = boundaries.iter().filter(|&&b| b < center_x).count();
        columns[index].push(run);
    }

    for column in &mut columns {
        column.sort_by(|a, b| {
            a.bbox
                .y0
                .partial_cmp(&b.bbox.y0)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.bbox.x0.partial_cmp(&b.bbox.x0).unwrap_or(Ordering::Equal))
        });
    }
    columns.retain(|c| !c.is_empty());

    log::debug!("ColumnSegmenter: {} columns", columns.len());
    columns
}

/// A run beginning a text segment: its left edge and its top.
#[derive(Debug, Clone, Copy)]
struct SegmentStart {
    x: f32,
    y: f32,
}

/// Runs that begin a text segment.
///
/// Word spacing stays well below the continuation reach while even a
/// narrow gutter exceeds it.
fn segment_starts(runs: &[TextRun], config: &ColumnConfig) -> Vec<SegmentStart> {
    runs.iter()
        .filter(|run| {
            let reach = run.font_size * config.segment_gap_factor;
            let slack = run.font_size * 0.5;
            !runs.iter().any(|other| {
                !std::ptr::eq(*run, other)
                    && same_line(run, other)
                    && other.bbox.x0 < run.bbox.x0
                    && (-slack..=reach).contains(&(run.bbox.x0 - other.bbox.x1))
            })
        })
        .filter(|run| run.bbox.x0 > 0.0)
        .map(|run| SegmentStart {
            x: run.bbox.x0,
            y: run.bbox.y0,
        })
        .collect()
}

fn same_line(a: &TextRun, b: &TextRun) -> bool {
    let (_, ca) = a.bbox.center();
    let (_, cb) = b.bbox.center();
    (ca - cb).abs() < a.bbox.height().min(b.bbox.height()) * 0.5
}

/// Boundary x positions, ascending.
fn column_boundaries(starts: &[SegmentStart], config: &ColumnConfig) -> Vec<f32> {
    let mut positions: Vec<f32> = starts.iter().map(|s| (s.x * 10.0).round() / 10.0).collect();
    positions.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    positions.dedup();
    if positions.len() < 2 {
        return Vec::new();
    }

    let gaps: Vec<(f32, f32)> = positions.windows(2).map(|w| (w[0], w[1] - w[0])).collect();
    let largest = gaps.iter().map(|(_, gap)| *gap).fold(0.0f32, f32::max);
    let threshold = (largest * config.gap_ratio).max(config.min_gap);

    let mut boundaries: Vec<f32> = gaps
        .iter()
        .filter(|(_, gap)| *gap > threshold)
        .map(|(left, gap)| left + gap / 2.0)
        .collect();

    // An interval whose starts sit on a single line (centered heading, page
    // number) is no column: merge it into its left neighbour.
    loop {
        let counts = interval_line_counts(starts, &boundaries);
        match counts.iter().position(|&c| c < config.min_column_lines) {
            Some(_) if boundaries.is_empty() => break,
            Some(0) => {
                boundaries.remove(0);
            }
            Some(index) => {
                boundaries.remove(index - 1);
            }
            None => break,
        }
    }
    boundaries
}

/// Number of distinct lines holding a segment start, per interval.
fn interval_line_counts(starts: &[SegmentStart], boundaries: &[f32]) -> Vec<usize> {
    let mut lines: Vec<Vec<f32>> = vec![Vec::new(); boundaries.len() + 1];
    for start in starts {
        let index = boundaries.iter().filter(|&&b| b < start.x).count();
        let y = start.y.round();
        if !lines[index].contains(&y) {
            lines[index].push(y);
        }
    }
    lines.iter().map(|l| l.len()).collect()
}
