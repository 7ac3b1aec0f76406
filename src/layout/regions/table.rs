//! Table detection.
//!
//! Three sources of tables, in priority order:
//! 1. cell grids handed over by a dedicated grid extractor,
//! 2. ruling lines: repeated horizontal and vertical rules forming a grid,
//! 3. text alignment: runs stacked at the same x positions (stream mode).
//!
//! Cells for (2) and (3) are rebuilt from the runs inside the region.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::{chain_clusters, dedup_regions, mean, overlaps_any};
use crate::geometry::BBox;
use crate::layout::collector::TextRun;
use crate::model::{LanguageInfo, Table};
use crate::source::{LineSegment, TableGrid};

/// Table detector configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableDetectorConfig {
    /// Maximum cross-axis delta for a rule to count as horizontal/vertical
    pub line_tolerance: f32,
    /// Minimum along-axis extent of a rule
    pub min_line_length: f32,
    /// Tolerance when clustering rules by their perpendicular coordinate
    pub cluster_tolerance: f32,
    /// Minimum width and height of a grid region
    pub min_region_size: f32,
    /// Minimum clustered rules per direction inside a grid region
    pub min_grid_lines: usize,
    /// Overlap ratio at which a candidate duplicates an accepted table
    pub dedup_threshold: f32,
    /// Grid regions covering more than this share of the page are page frames
    pub max_page_coverage: f32,

    /// Bucket width for text x0 positions
    pub text_bucket_width: f32,
    /// Buckets closer than this are chained into one column
    pub text_bucket_merge: f32,
    /// Maximum distance of a run's x0 from its column center
    pub text_member_distance: f32,
    /// Minimum aligned runs per column
    pub min_column_items: usize,
    /// Minimum aligned columns
    pub min_columns: usize,
    /// Minimum aligned runs overall
    pub min_aligned_runs: usize,
    /// Minimum share of rows holding two or more cells
    pub min_multi_cell_rows: f32,
    /// Maximum mean run length (chars) of an aligned table
    pub max_mean_cell_chars: f32,
    /// Minimum share of the region's runs that are aligned
    pub min_aligned_share: f32,
    /// Maximum mean run width relative to the column pitch
    pub max_cell_pitch_ratio: f32,
    /// Share of a column's runs that must be numeric for it to count as numeric
    pub min_numeric_share: f32,

    /// Row clustering tolerance for cell reconstruction
    pub cell_row_tolerance: f32,
    /// Column clustering tolerance for cell reconstruction
    pub cell_column_tolerance: f32,
    /// Maximum distance of a run's x0 from the column it is assigned to
    pub cell_assign_distance: f32,
}

impl Default for TableDetectorConfig {
    fn default() -> Self {
        Self {
            line_tolerance: 3.0,
            min_line_length: 10.0,
            cluster_tolerance: 5.0,
            min_region_size: 50.0,
            min_grid_lines: 2,
            dedup_threshold: 0.5,
            max_page_coverage: 0.9,
            text_bucket_width: 10.0,
            text_bucket_merge: 20.0,
            text_member_distance: 30.0,
            min_column_items: 3,
            min_columns: 2,
            min_aligned_runs: 6,
            min_multi_cell_rows: 0.5,
            max_mean_cell_chars: 40.0,
            min_aligned_share: 0.6,
            max_cell_pitch_ratio: 0.5,
            min_numeric_share: 0.5,
            cell_row_tolerance: 5.0,
            cell_column_tolerance: 20.0,
            cell_assign_distance: 30.0,
        }
    }
}

/// A group of parallel rules sharing a perpendicular coordinate.
#[derive(Debug, Clone)]
struct RuleCluster {
    /// Mean perpendicular coordinate
    position: f32,
    /// Extent along the rule direction
    start: f32,
    end: f32,
}

/// Detects table regions and rebuilds their cells.
pub struct TableDetector {
    config: TableDetectorConfig,
}

impl TableDetector {
    /// Create a new table detector with default configuration.
    pub fn new() -> Self {
        Self::with_config(TableDetectorConfig::default())
    }

    /// Create a new table detector with custom configuration.
    pub fn with_config(config: TableDetectorConfig) -> Self {
        Self { config }
    }

    /// Detect all tables of a page.
    ///
    /// Grids from a dedicated extractor are accepted first; geometric and
    /// text-aligned candidates follow only when they do not duplicate an
    /// accepted table.
    pub fn detect(
        &self,
        page_number: u32,
        page_size: (f32, f32),
        grids: &[TableGrid],
        lines: &[LineSegment],
        runs: &[TextRun],
        detect_text_tables: bool,
        mut language_of: impl FnMut(&str) -> LanguageInfo,
    ) -> Vec<Table> {
        let mut tables: Vec<Table> = Vec::new();
        let mut accepted: Vec<BBox> = Vec::new();

        // Step 1: collaborator grids
        for grid in grids {
            if grid.rows.iter().all(|row| row.iter().all(|c| c.trim().is_empty())) {
                continue;
            }
            let id = Table::make_id(page_number, tables.len());
            tables.push(Table::from_grid(id, page_number, grid.bbox.rounded(), &grid.rows, &mut language_of));
            accepted.push(grid.bbox);
        }

        // Step 2: ruling lines, then text alignment
        let mut candidates = self.detect_grid_regions(lines, page_size);
        if detect_text_tables {
            candidates.extend(self.detect_text_regions(runs));
        }

        for region in dedup_regions(candidates, self.config.dedup_threshold) {
            if overlaps_any(&region, &accepted, self.config.dedup_threshold) {
                continue;
            }
            let rows = self.reconstruct_cells(&region, runs);
            if rows.is_empty() {
                continue;
            }
            let id = Table::make_id(page_number, tables.len());
            tables.push(Table::from_grid(id, page_number, region.rounded(), &rows, &mut language_of));
            accepted.push(region);
        }

        log::debug!("TableDetector: page {} has {} tables", page_number, tables.len());
        tables
    }

    /// Regions bounded by clustered horizontal and vertical rules.
    ///
    /// Frames spanning nearly the whole page (borders, backgrounds) are not
    /// tables.
    pub fn detect_grid_regions(&self, lines: &[LineSegment], page_size: (f32, f32)) -> Vec<BBox> {
        let tol = self.config.line_tolerance;
        let min_len = self.config.min_line_length;

        let horizontal: Vec<&LineSegment> =
            lines.iter().filter(|l| l.dy() < tol && l.dx() > min_len).collect();
        let vertical: Vec<&LineSegment> =
            lines.iter().filter(|l| l.dx() < tol && l.dy() > min_len).collect();
        if horizontal.len() < self.config.min_grid_lines || vertical.len() < self.config.min_grid_lines {
            return Vec::new();
        }

        let h_clusters = self.cluster_rules(
            horizontal
                .iter()
                .map(|l| ((l.y0 + l.y1) / 2.0, l.x0.min(l.x1), l.x0.max(l.x1)))
                .collect(),
        );
        let v_clusters = self.cluster_rules(
            vertical
                .iter()
                .map(|l| ((l.x0 + l.x1) / 2.0, l.y0.min(l.y1), l.y0.max(l.y1)))
                .collect(),
        );
        log::debug!(
            "TableDetector: {} horizontal and {} vertical rule clusters",
            h_clusters.len(),
            v_clusters.len()
        );

        let min_size = self.config.min_region_size;
        let max_area = page_size.0 * page_size.1 * self.config.max_page_coverage;
        let slack = self.config.cluster_tolerance;
        let mut regions = Vec::new();

        for h in &h_clusters {
            for v in &v_clusters {
                // The two rules must cross for their extents to bound a grid
                let crosses = v.position >= h.start - slack
                    && v.position <= h.end + slack
                    && h.position >= v.start - slack
                    && h.position <= v.end + slack;
                if !crosses {
                    continue;
                }
                let region = BBox::new(h.start, v.start, h.end, v.end);
                if region.width() <= min_size || region.height() <= min_size {
                    continue;
                }
                if max_area > 0.0 && region.area() > max_area {
                    continue;
                }

                let rows_inside = h_clusters
                    .iter()
                    .filter(|c| c.position >= region.y0 - slack && c.position <= region.y1 + slack)
                    .count();
                let cols_inside = v_clusters
                    .iter()
                    .filter(|c| c.position >= region.x0 - slack && c.position <= region.x1 + slack)
                    .count();

                if rows_inside >= self.config.min_grid_lines && cols_inside >= self.config.min_grid_lines {
                    regions.push(region);
                }
            }
        }

        regions
    }

    /// Cluster rules given as `(position, start, end)`.
    fn cluster_rules(&self, mut rules: Vec<(f32, f32, f32)>) -> Vec<RuleCluster> {
        rules.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

        let mut clusters: Vec<(Vec<f32>, f32, f32)> = Vec::new();
        for (position, start, end) in rules {
            match clusters.last_mut() {
                Some((positions, s, e))
                    if positions
                        .first()
                        .is_some_and(|first| position - first <= self.config.cluster_tolerance) =>
                {
                    positions.push(position);
                    *s = s.min(start);
                    *e = e.max(end);
                }
                _ => clusters.push((vec![position], start, end)),
            }
        }

        clusters
            .into_iter()
            .map(|(positions, start, end)| RuleCluster {
                position: mean(&positions),
                start,
                end,
            })
            .collect()
    }

    /// Regions of runs aligned into columns without ruling lines.
    pub fn detect_text_regions(&self, runs: &[TextRun]) -> Vec<BBox> {
        if runs.len() < self.config.min_aligned_runs {
            return Vec::new();
        }

        // Step 1: bucket x0 positions and chain nearby buckets
        let bucket = self.config.text_bucket_width;
        let keys: Vec<f32> = runs
            .iter()
            .map(|r| (r.bbox.x0 / bucket).round() * bucket)
            .collect();
        let groups = chain_clusters(&keys, self.config.text_bucket_merge);

        // Step 2: column center is the mean x0 of the runs in the chain
        let mut columns: Vec<Vec<&TextRun>> = Vec::new();
        for group in &groups {
            let (lo, hi) = (group[0] - bucket / 2.0, group[group.len() - 1] + bucket / 2.0);
            let in_chain: Vec<f32> = runs
                .iter()
                .map(|r| r.bbox.x0)
                .filter(|x| *x >= lo && *x < hi)
                .collect();
            let center = mean(&in_chain);
            let members: Vec<&TextRun> = runs
                .iter()
                .filter(|r| (r.bbox.x0 - center).abs() < self.config.text_member_distance)
                .collect();
            if members.len() >= self.config.min_column_items {
                columns.push(members);
            }
        }

        let aligned: usize = columns.iter().map(|c| c.len()).sum();
        if columns.len() < self.config.min_columns || aligned < self.config.min_aligned_runs {
            return Vec::new();
        }

        // Step 3: table cells leave whitespace between columns or hold figures;
        // prose columns fill their pitch with words
        if !self.has_cell_structure(&columns) {
            return Vec::new();
        }

        let mut members: Vec<&TextRun> = columns.into_iter().flatten().collect();
        members.sort_by_key(|r| r.order);
        members.dedup_by_key(|r| r.order);

        let Some(region) = members.iter().map(|r| r.bbox).reduce(|a, b| a.union(&b)) else {
            return Vec::new();
        };

        // Step 4: reject prose that happens to align
        let row_sizes: Vec<usize> = chain_clusters(
            &members.iter().map(|r| r.bbox.y0).collect::<Vec<_>>(),
            self.config.cell_row_tolerance,
        )
        .iter()
        .map(|row| row.len())
        .collect();
        let multi_cell = row_sizes.iter().filter(|n| **n >= 2).count();
        if (multi_cell as f32) < row_sizes.len() as f32 * self.config.min_multi_cell_rows {
            return Vec::new();
        }

        let mean_chars = members.iter().map(|r| r.char_count()).sum::<usize>() as f32 / members.len() as f32;
        if mean_chars > self.config.max_mean_cell_chars {
            return Vec::new();
        }

        let inside = runs
            .iter()
            .filter(|r| {
                let (cx, cy) = r.bbox.center();
                region.contains_point(cx, cy)
            })
            .count();
        if inside > 0 && (members.len() as f32 / inside as f32) < self.config.min_aligned_share {
            return Vec::new();
        }

        log::debug!(
            "TableDetector: text-aligned table with {} runs over {} rows",
            members.len(),
            row_sizes.len()
        );
        vec![region]
    }

    /// Whether aligned columns look like table cells rather than prose.
    fn has_cell_structure(&self, columns: &[Vec<&TextRun>]) -> bool {
        let numeric = columns.iter().any(|column| {
            let count = column.iter().filter(|r| is_numeric_cell(&r.text)).count();
            count as f32 >= column.len() as f32 * self.config.min_numeric_share
        });
        if numeric {
            return true;
        }

        let mut lefts: Vec<f32> = columns
            .iter()
            .map(|column| mean(&column.iter().map(|r| r.bbox.x0).collect::<Vec<_>>()))
            .collect();
        lefts.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        let pitch = mean(&lefts.windows(2).map(|w| w[1] - w[0]).collect::<Vec<_>>());
        let width = mean(&columns.iter().flatten().map(|r| r.bbox.width()).collect::<Vec<_>>());

        pitch > 0.0 && width / pitch <= self.config.max_cell_pitch_ratio
    }

    /// Rebuild a row-major cell grid from the runs inside `region`.
    pub fn reconstruct_cells(&self, region: &BBox, runs: &[TextRun]) -> Vec<Vec<String>> {
        let mut inside: Vec<&TextRun> = runs
            .iter()
            .filter(|r| region.contains_point(r.bbox.x0, r.bbox.y0))
            .collect();
        if inside.is_empty() {
            return Vec::new();
        }
        inside.sort_by(|a, b| {
            a.bbox
                .x0
                .partial_cmp(&b.bbox.x0)
                .unwrap_or(Ordering::Equal)
        });

        let rows = chain_clusters(
            &inside.iter().map(|r| r.bbox.y0).collect::<Vec<_>>(),
            self.config.cell_row_tolerance,
        );
        let columns: Vec<f32> = chain_clusters(
            &inside.iter().map(|r| r.bbox.x0).collect::<Vec<_>>(),
            self.config.cell_column_tolerance,
        )
        .iter()
        .map(|c| mean(c))
        .collect();

        let mut grid = vec![vec![String::new(); columns.len()]; rows.len()];
        for run in inside {
            let Some(row) = rows.iter().position(|r| r.contains(&run.bbox.y0)) else {
                continue;
            };
            let Some(col) = columns
                .iter()
                .position(|c| (run.bbox.x0 - c).abs() < self.config.cell_assign_distance)
            else {
                continue;
            };
            let cell = &mut grid[row][col];
            if !cell.is_empty() {
                cell.push(' ');
            }
            cell.push_str(&run.text);
        }

        grid
    }
}

/// Mostly digits: amounts, years, percentages.
fn is_numeric_cell(text: &str) -> bool {
    let chars: Vec<char> = text.chars().filter(|c| !c.is_whitespace()).collect();
    let digits = chars.iter().filter(|c| c.is_ascii_digit()).count();
    !chars.is_empty() && digits * 2 >= chars.len()
}

impl Default for TableDetector {
    fn default() -> Self {
        Self::new()
    }
}
