//! Vector chart detection.
//!
//! A chart is recognized from its axes (a long horizontal and a long
//! vertical line) or from plotted curves. Text inside the region is sorted
//! into chart components, and percentage values are read as data points.

use std::collections::BTreeSet;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::dedup_regions;
use crate::geometry::BBox;
use crate::layout::collector::TextRun;
use crate::model::{ChartAxes, ChartComponents, ChartData, ChartSeries, DataPoint};
use crate::source::VectorPrimitives;

/// Chart detector configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartDetectorConfig {
    /// Minimum length of an axis candidate
    pub min_axis_length: f32,
    /// Maximum cross-axis delta of an axis candidate
    pub axis_tolerance: f32,
    /// Margin added around an axis pair
    pub axis_margin: f32,
    /// Minimum width and height of an axis-based region
    pub min_region_size: f32,
    /// Minimum points for a curve to be considered
    pub min_curve_points: usize,
    /// Minimum width and height spanned by a curve
    pub min_curve_extent: f32,
    /// Margin added around a curve
    pub curve_margin: f32,
    /// Overlap ratio at which a candidate duplicates an accepted chart
    pub dedup_threshold: f32,

    /// Minimum font size of a chart title
    pub title_min_font: f32,
    /// A title sits at least this far above the region center
    pub title_offset: f32,
    /// ...or within this distance of the horizontal center
    pub title_center_distance: f32,
    /// Distance from the region edge for axis labels
    pub axis_label_distance: f32,
    /// Data labels use fonts smaller than this
    pub data_label_max_font: f32,
    /// Data labels lie within this share of the width from the center
    pub data_label_width_ratio: f32,
    /// Vertical strokes inside a region needed to call it a bar chart
    pub min_bar_strokes: usize,
}

impl Default for ChartDetectorConfig {
    fn default() -> Self {
        Self {
            min_axis_length: 50.0,
            axis_tolerance: 5.0,
            axis_margin: 50.0,
            min_region_size: 100.0,
            min_curve_points: 4,
            min_curve_extent: 50.0,
            curve_margin: 20.0,
            dedup_threshold: 0.3,
            title_min_font: 10.0,
            title_offset: 20.0,
            title_center_distance: 30.0,
            axis_label_distance: 20.0,
            data_label_max_font: 9.0,
            data_label_width_ratio: 0.4,
            min_bar_strokes: 5,
        }
    }
}

/// A detected chart region with what the geometry says about it.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartCandidate {
    pub bbox: BBox,
    pub axes: ChartAxes,
    /// `bar`, `line` or `unknown`
    pub chart_type: String,
}

/// Finds chart regions in vector geometry.
pub struct ChartDetector {
    config: ChartDetectorConfig,
    year_pattern: Regex,
    percent_pattern: Regex,
}

impl ChartDetector {
    pub fn new() -> Self {
        Self::with_config(ChartDetectorConfig::default())
    }

    pub fn with_config(config: ChartDetectorConfig) -> Self {
        Self {
            config,
            year_pattern: Regex::new(r"\b(?:19|20)\d{2}\b").expect("valid regex"),
            percent_pattern: Regex::new(r"(\d+(?:\.\d+)?)\s*%").expect("valid regex"),
        }
    }

    /// Detect chart regions on a page of the given size.
    pub fn detect(&self, primitives: &VectorPrimitives, width: f32, height: f32) -> Vec<ChartCandidate> {
        let cfg = &self.config;

        let long_lines = primitives.lines.iter().filter(|l| l.length() > cfg.min_axis_length);
        let horizontal: Vec<_> = long_lines.clone().filter(|l| l.dy() < cfg.axis_tolerance).collect();
        let vertical: Vec<_> = long_lines.filter(|l| l.dx() < cfg.axis_tolerance).collect();

        let mut candidates = Vec::new();

        // Step 1: axis corners
        for h in &horizontal {
            for v in &vertical {
                let region = h
                    .bbox()
                    .union(&v.bbox())
                    .expand(cfg.axis_margin)
                    .clamp(width, height);
                if region.width() > cfg.min_region_size && region.height() > cfg.min_region_size {
                    candidates.push(region);
                }
            }
        }

        // Step 2: dense curves
        for curve in &primitives.curves {
            if curve.points.len() < cfg.min_curve_points {
                continue;
            }
            if let Some(extent) = curve.bbox() {
                if extent.width() > cfg.min_curve_extent && extent.height() > cfg.min_curve_extent {
                    candidates.push(extent.expand(cfg.curve_margin).clamp(width, height));
                }
            }
        }

        let regions = dedup_regions(candidates, cfg.dedup_threshold);
        log::debug!("ChartDetector: {} chart regions", regions.len());

        regions
            .into_iter()
            .map(|bbox| self.describe(bbox, primitives))
            .collect()
    }

    /// Axis flags and chart type of a detected region.
    fn describe(&self, bbox: BBox, primitives: &VectorPrimitives) -> ChartCandidate {
        let cfg = &self.config;
        let inside = |x0: f32, y0: f32, x1: f32, y1: f32| bbox.contains_point((x0 + x1) / 2.0, (y0 + y1) / 2.0);

        let mut axes = ChartAxes::default();
        let mut vertical_strokes = 0;
        for line in &primitives.lines {
            if !inside(line.x0, line.y0, line.x1, line.y1) {
                continue;
            }
            if line.dx() < cfg.axis_tolerance && line.dy() > 0.0 {
                vertical_strokes += 1;
                if line.length() > cfg.min_axis_length {
                    axes.has_vertical_axis = true;
                }
            } else if line.dy() < cfg.axis_tolerance && line.length() > cfg.min_axis_length {
                axes.has_horizontal_axis = true;
            }
        }

        let has_curves = primitives.curves.iter().any(|c| {
            c.bbox()
                .is_some_and(|b| inside(b.x0, b.y0, b.x1, b.y1))
        });

        // The axis itself is one vertical stroke.
        let chart_type = if vertical_strokes > cfg.min_bar_strokes {
            "bar"
        } else if has_curves {
            "line"
        } else {
            "unknown"
        };

        ChartCandidate {
            bbox,
            axes,
            chart_type: chart_type.to_string(),
        }
    }

    /// Sort the runs inside `bbox` into chart components.
    pub fn components(&self, bbox: &BBox, runs: &[TextRun]) -> ChartComponents {
        let cfg = &self.config;
        let (center_x, center_y) = bbox.center();
        let mut components = ChartComponents::default();
        let mut title: Option<&TextRun> = None;

        for run in runs {
            let (cx, cy) = run.bbox.center();
            if !bbox.contains_point(cx, cy) {
                continue;
            }
            components.internal_text.push(run.text.clone());

            let title_like = run.font_size > cfg.title_min_font
                && (cy < center_y - cfg.title_offset || (cx - center_x).abs() < cfg.title_center_distance);
            let near_edge = (cx - bbox.x0).abs() < cfg.axis_label_distance
                || (cx - bbox.x1).abs() < cfg.axis_label_distance
                || (cy - bbox.y0).abs() < cfg.axis_label_distance
                || (cy - bbox.y1).abs() < cfg.axis_label_distance;

            if title_like {
                // The largest title-like run wins; a displaced one is legend text.
                match title {
                    Some(current) if current.font_size >= run.font_size => {
                        components.legend.push(run.text.clone())
                    }
                    Some(current) => {
                        components.legend.push(current.text.clone());
                        title = Some(run);
                    }
                    None => title = Some(run),
                }
            } else if near_edge {
                components.axis_labels.push(run.text.clone());
            } else if run.font_size < cfg.data_label_max_font
                && (cx - center_x).abs() < bbox.width() * cfg.data_label_width_ratio
            {
                components.data_labels.push(run.text.clone());
            } else {
                components.legend.push(run.text.clone());
            }
        }

        components.title = title.map(|run| run.text.clone());
        components
    }

    /// Read percentage data points from chart text, grouped by year.
    ///
    /// Returns `None` when the text holds no data points.
    pub fn chart_data(&self, texts: &[String], chart_type: &str, axes: ChartAxes) -> Option<ChartData> {
        let mut points = Vec::new();
        for text in texts {
            for caps in self.percent_pattern.captures_iter(text) {
                if let Ok(value) = caps[1].parse::<f64>() {
                    points.push(DataPoint {
                        value,
                        unit: "percentage".to_string(),
                        text_context: text.clone(),
                    });
                }
            }
        }
        if points.is_empty() {
            return None;
        }

        let years: BTreeSet<&str> = texts
            .iter()
            .flat_map(|t| self.year_pattern.find_iter(t).map(|m| m.as_str()))
            .collect();

        let mut series: Vec<ChartSeries> = years
            .iter()
            .map(|year| ChartSeries {
                name: year.to_string(),
                data_points: points
                    .iter()
                    .filter(|p| p.text_context.contains(year))
                    .cloned()
                    .collect(),
            })
            .filter(|s| !s.data_points.is_empty())
            .collect();
        if series.is_empty() {
            series.push(ChartSeries {
                name: "default".to_string(),
                data_points: points,
            });
        }

        let confidence = if chart_type == "unknown" { 0.4 } else { 0.6 };
        Some(ChartData {
            chart_type: chart_type.to_string(),
            series,
            axes,
            extraction_method: "embedded_text".to_string(),
            confidence,
        })
    }
}

impl Default for ChartDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{Curve, LineSegment};

    fn make_run(text: &str, x0: f32, y0: f32, size: f32) -> TextRun {
        TextRun::new(text, BBox::new(x0, y0, x0 + text.len() as f32 * size * 0.5, y0 + size), size)
    }

    fn make_axes(x: f32, y_top: f32, y_axis: f32, x_end: f32) -> Vec<LineSegment> {
        vec![
            LineSegment::new(x, y_axis, x_end, y_axis),
            LineSegment::new(x, y_top, x, y_axis),
        ]
    }

    #[test]
    fn test_axis_pair_detected_with_margin() {
        let detector = ChartDetector::new();
        let primitives = VectorPrimitives {
            lines: make_axes(100.0, 200.0, 400.0, 400.0),
            curves: vec![],
        };

        let charts = detector.detect(&primitives, 600.0, 800.0);
        assert_eq!(charts.len(), 1);
        assert_eq!(charts[0].bbox, BBox::new(50.0, 150.0, 450.0, 450.0));
        assert!(charts[0].axes.has_horizontal_axis);
        assert!(charts[0].axes.has_vertical_axis);
        assert_eq!(charts[0].chart_type, "unknown");
    }

    #[test]
    fn test_bars_make_bar_chart() {
        let detector = ChartDetector::new();
        let mut lines = make_axes(100.0, 200.0, 400.0, 400.0);
        for i in 0..6 {
            let x = 130.0 + i as f32 * 40.0;
            lines.push(LineSegment::new(x, 300.0, x, 400.0));
        }
        let charts = detector.detect(&VectorPrimitives { lines, curves: vec![] }, 600.0, 800.0);
        assert_eq!(charts[0].chart_type, "bar");
    }

    #[test]
    fn test_curve_region() {
        let detector = ChartDetector::new();
        let curve = Curve {
            points: vec![(100.0, 300.0), (150.0, 250.0), (200.0, 280.0), (260.0, 200.0)],
        };
        let charts = detector.detect(&VectorPrimitives { lines: vec![], curves: vec![curve] }, 600.0, 800.0);
        assert_eq!(charts.len(), 1);
        assert_eq!(charts[0].bbox, BBox::new(80.0, 180.0, 280.0, 320.0));
        assert_eq!(charts[0].chart_type, "line");
    }

    #[test]
    fn test_short_lines_ignored() {
        let detector = ChartDetector::new();
        let primitives = VectorPrimitives {
            lines: make_axes(100.0, 380.0, 400.0, 140.0),
            curves: vec![],
        };
        assert!(detector.detect(&primitives, 600.0, 800.0).is_empty());
    }

    #[test]
    fn test_components_categorized() {
        let detector = ChartDetector::new();
        let bbox = BBox::new(0.0, 0.0, 400.0, 300.0);
        let runs = vec![
            make_run("GDP growth", 170.0, 20.0, 14.0),
            make_run("Subtitle", 150.0, 40.0, 11.0),
            make_run("2020", 5.0, 150.0, 9.0),
            make_run("3.5%", 190.0, 150.0, 8.0),
            make_run("Exports", 300.0, 200.0, 10.0),
            make_run("outside", 500.0, 500.0, 10.0),
        ];

        let components = detector.components(&bbox, &runs);
        assert_eq!(components.title.as_deref(), Some("GDP growth"));
        assert_eq!(components.legend, vec!["Subtitle", "Exports"]);
        assert_eq!(components.axis_labels, vec!["2020"]);
        assert_eq!(components.data_labels, vec!["3.5%"]);
        assert_eq!(components.internal_text.len(), 5);
    }

    #[test]
    fn test_chart_data_series_by_year() {
        let detector = ChartDetector::new();
        let texts = vec![
            "2023: 4.5%".to_string(),
            "2024: 3.2 %".to_string(),
            "Outlook".to_string(),
        ];
        let data = detector.chart_data(&texts, "bar", ChartAxes::default()).unwrap();

        assert_eq!(data.extraction_method, "embedded_text");
        assert_eq!(data.series.len(), 2);
        assert_eq!(data.series[0].name, "2023");
        assert_eq!(data.series[0].data_points[0].value, 4.5);
        assert_eq!(data.series[1].data_points[0].unit, "percentage");
    }

    #[test]
    fn test_chart_data_default_series_and_none() {
        let detector = ChartDetector::new();
        let data = detector
            .chart_data(&["Share 12%".to_string(), "Rest 88%".to_string()], "unknown", ChartAxes::default())
            .unwrap();
        assert_eq!(data.series.len(), 1);
        assert_eq!(data.series[0].name, "default");
        assert_eq!(data.series[0].data_points.len(), 2);

        assert!(detector
            .chart_data(&["No numbers here".to_string()], "bar", ChartAxes::default())
            .is_none());
    }
}
