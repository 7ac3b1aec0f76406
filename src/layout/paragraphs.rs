//! Line and paragraph assembly within one column.
//!
//! Runs are merged into lines by vertical overlap, lines into paragraphs by
//! vertical gaps. The gap threshold is derived from the column's own gap
//! statistics so normal leading never splits a paragraph. The first lines
//! of a paragraph may be lifted out as its title and subtitle.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::cleanup::TextCleaner;
use super::collector::TextRun;
use super::regions::mean;
use super::titles::{TitleDetector, TitleKind};
use crate::geometry::BBox;
use crate::language::is_spaceless_script_char;
use crate::model::Role;

/// Paragraph assembler configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParagraphConfig {
    /// Runs share a line when their centres differ by less than this share of the smaller height
    pub line_overlap: f32,
    /// Space inserted when the horizontal gap exceeds this share of a character width
    pub space_ratio: f32,

    /// Lower bound of the break threshold
    pub min_break_threshold: f32,
    /// Break threshold for columns without positive gaps
    pub default_break_threshold: f32,
    /// Typical line spacing for columns without positive gaps
    pub default_line_spacing: f32,
    pub p90_factor: f32,
    pub median_factor: f32,
    pub mean_factor: f32,

    /// Leftward jump marking text resuming below
    pub wrap_x_jump: f32,
    pub wrap_min_gap: f32,
    pub wrap_max_gap: f32,

    /// Gap, in typical spacings, before a title that follows a finished sentence
    pub title_gap: f32,

    /// Paragraphs longer than this close at the next moderate gap
    pub max_chars: usize,
    /// Moderate gap, in typical spacings
    pub long_break_gap: f32,

    /// Shorter bodies without a title or subtitle are dropped
    pub min_chars: usize,
}

impl Default for ParagraphConfig {
    fn default() -> Self {
        Self {
            line_overlap: 0.5,
            space_ratio: 0.2,
            min_break_threshold: 25.0,
            default_break_threshold: 30.0,
            default_line_spacing: 10.0,
            p90_factor: 1.5,
            median_factor: 4.0,
            mean_factor: 3.0,
            wrap_x_jump: 80.0,
            wrap_min_gap: 1.5,
            wrap_max_gap: 2.0,
            title_gap: 3.5,
            max_chars: 3000,
            long_break_gap: 2.0,
            min_chars: 50,
        }
    }
}

/// Runs on the same baseline, left to right.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub runs: Vec<TextRun>,
    pub bbox: BBox,
    pub text: String,
    /// Largest run size
    pub font_size: f32,
    /// Bold flag of the largest run
    pub bold: bool,
}

impl Line {
    fn from_runs(mut runs: Vec<TextRun>, space_ratio: f32) -> Self {
        runs.sort_by(|a, b| a.bbox.x0.partial_cmp(&b.bbox.x0).unwrap_or(Ordering::Equal));

        let mut text = String::new();
        for (i, run) in runs.iter().enumerate() {
            if i > 0 && needs_space(&runs[i - 1], run, space_ratio) {
                text.push(' ');
            }
            text.push_str(&run.text);
        }

        let bbox = runs
            .iter()
            .skip(1)
            .fold(runs[0].bbox, |acc, run| acc.union(&run.bbox));
        let largest = runs
            .iter()
            .reduce(|best, run| if run.font_size > best.font_size { run } else { best });

        Self {
            font_size: largest.map(|r| r.font_size).unwrap_or(0.0),
            bold: largest.is_some_and(|r| r.bold),
            bbox,
            text,
            runs,
        }
    }

    fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// Whether a space goes between two adjacent runs of a line.
fn needs_space(prev: &TextRun, run: &TextRun, space_ratio: f32) -> bool {
    let gap = run.bbox.x0 - prev.bbox.x1;
    let chars = run.char_count();
    let avg_char_width = if chars > 0 && run.bbox.width() > 0.0 {
        run.bbox.width() / chars as f32
    } else {
        run.font_size * 0.5
    };
    if gap <= avg_char_width * space_ratio {
        return false;
    }

    let prev_spaceless = prev.text.chars().last().is_some_and(is_spaceless_script_char);
    let curr_spaceless = run.text.chars().next().is_some_and(is_spaceless_script_char);
    if prev_spaceless && curr_spaceless {
        return false;
    }
    !prev.text.ends_with(char::is_whitespace) && !run.text.starts_with(char::is_whitespace)
}

/// Group column runs (sorted top to bottom) into lines.
pub fn build_lines(runs: &[TextRun], config: &ParagraphConfig) -> Vec<Line> {
    let mut groups: Vec<Vec<TextRun>> = Vec::new();

    for run in runs {
        let joins = groups.last().and_then(|g| g.first()).is_some_and(|anchor| {
            let (_, ca) = anchor.bbox.center();
            let (_, cr) = run.bbox.center();
            (ca - cr).abs() < anchor.bbox.height().min(run.bbox.height()) * config.line_overlap
        });
        match groups.last_mut() {
            Some(group) if joins => group.push(run.clone()),
            _ => groups.push(vec![run.clone()]),
        }
    }

    groups
        .into_iter()
        .map(|group| Line::from_runs(group, config.space_ratio))
        .collect()
}

/// A block candidate before classification.
#[derive(Debug, Clone, PartialEq)]
pub struct ProtoBlock {
    pub text: String,
    pub bbox: BBox,
    pub font_size: f32,
    pub bold: bool,
    pub role: Role,
    pub is_multi_column: bool,
}

impl ProtoBlock {
    fn from_lines(text: String, lines: &[&Line]) -> Self {
        let bbox = lines
            .iter()
            .skip(1)
            .fold(lines[0].bbox, |acc, line| acc.union(&line.bbox));
        let largest = lines
            .iter()
            .copied()
            .reduce(|best, line| if line.font_size > best.font_size { line } else { best });

        Self {
            text,
            bbox,
            font_size: largest.map(|l| l.font_size).unwrap_or(0.0),
            bold: largest.is_some_and(|l| l.bold),
            role: Role::Paragraph,
            is_multi_column: false,
        }
    }
}

/// Line gap statistics of one column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GapStats {
    /// Median positive gap, or the default spacing
    pub typical: f32,
    pub threshold: f32,
}

impl GapStats {
    pub fn from_lines(lines: &[Line], config: &ParagraphConfig) -> Self {
        let mut gaps: Vec<f32> = lines
            .windows(2)
            .map(|w| w[1].bbox.y0 - w[0].bbox.y1)
            .filter(|&gap| gap > 0.0)
            .collect();
        if gaps.is_empty() {
            return Self {
                typical: config.default_line_spacing,
                threshold: config.default_break_threshold,
            };
        }
        gaps.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

        let len = gaps.len();
        let median = gaps[len / 2];
        let p75 = if len > 4 { gaps[(len as f32 * 0.75) as usize] } else { median };
        let p90 = if len > 10 { gaps[(len as f32 * 0.9) as usize] } else { p75 };
        let threshold = (p90 * config.p90_factor)
            .max(median * config.median_factor)
            .max(mean(&gaps) * config.mean_factor)
            .max(config.min_break_threshold);

        Self {
            typical: median,
            threshold,
        }
    }
}

/// Assembles the runs of one column into block candidates.
pub struct ParagraphAssembler {
    config: ParagraphConfig,
    titles: TitleDetector,
    cleaner: TextCleaner,
}

impl ParagraphAssembler {
    pub fn new(config: ParagraphConfig, titles: TitleDetector) -> Self {
        Self {
            config,
            titles,
            cleaner: TextCleaner::new(),
        }
    }

    /// Assemble one column. Each paragraph yields its title, subtitle and
    /// body as separate candidates, in that order.
    pub fn assemble(&self, runs: &[TextRun]) -> Vec<ProtoBlock> {
        let cfg = &self.config;
        let lines = build_lines(runs, cfg);
        if lines.is_empty() {
            return Vec::new();
        }

        let sizes: Vec<f32> = lines.iter().map(|l| l.font_size).collect();
        let avg_font_size = mean(&sizes);
        let stats = GapStats::from_lines(&lines, cfg);

        let mut blocks = Vec::new();
        let mut current: Vec<&Line> = Vec::new();
        let mut current_chars = 0;

        for line in &lines {
            if let Some(prev) = current.last() {
                let gap = line.bbox.y0 - prev.bbox.y1;
                let mut is_break = gap > stats.threshold;

                if !is_break {
                    let x_gap = line.bbox.x0 - prev.bbox.x1;
                    is_break = x_gap < -cfg.wrap_x_jump
                        && gap.abs() < stats.typical * cfg.wrap_max_gap
                        && gap > stats.typical * cfg.wrap_min_gap;
                }

                if !is_break && gap > stats.typical * cfg.title_gap {
                    is_break = prev.text.trim_end().ends_with(&['.', '!', '?'][..])
                        && self
                            .titles
                            .detect(&line.text, line.font_size, avg_font_size, true)
                            .is_some();
                }

                if !is_break && current_chars > cfg.max_chars && gap > stats.typical * cfg.long_break_gap {
                    is_break = true;
                }

                if is_break {
                    blocks.extend(self.finish(&current, avg_font_size));
                    current.clear();
                    current_chars = 0;
                }
            }
            current_chars += line.char_count();
            current.push(line);
        }
        blocks.extend(self.finish(&current, avg_font_size));

        log::debug!(
            "ParagraphAssembler: {} lines -> {} blocks (threshold {:.1})",
            lines.len(),
            blocks.len(),
            stats.threshold
        );
        blocks
    }

    /// Turn the lines of one paragraph into block candidates.
    fn finish(&self, lines: &[&Line], avg_font_size: f32) -> Vec<ProtoBlock> {
        let Some(first) = lines.first() else {
            return Vec::new();
        };

        let mut title = None;
        let mut subtitle = None;
        let mut consumed = 0;

        match self.titles.detect(&first.text, first.font_size, avg_font_size, true) {
            Some(TitleKind::Title) => {
                title = Some(ProtoBlock::from_lines(first.text.trim().to_string(), &[*first]));
                consumed = 1;
                if let Some(second) = lines.get(1) {
                    if self
                        .titles
                        .detect(&second.text, second.font_size, avg_font_size, false)
                        .is_some()
                    {
                        subtitle = Some(ProtoBlock::from_lines(second.text.trim().to_string(), &[*second]));
                        consumed = 2;
                    }
                }
            }
            Some(TitleKind::Subtitle) => {
                subtitle = Some(ProtoBlock::from_lines(first.text.trim().to_string(), &[*first]));
                consumed = 1;
            }
            None => {}
        }

        let body_lines: Vec<&Line> = lines[consumed..]
            .iter()
            .copied()
            .filter(|line| !self.cleaner.is_metadata_line(&line.text))
            .collect();

        let mut body = None;
        if !body_lines.is_empty() {
            let joined = body_lines
                .iter()
                .map(|l| l.text.trim())
                .collect::<Vec<_>>()
                .join(" ");
            let text = self.cleaner.clean(&joined);

            if text.chars().count() < self.config.min_chars && title.is_none() && subtitle.is_none() {
                return Vec::new();
            }
            if !text.is_empty() && !self.cleaner.is_noise(&text) && !self.cleaner.starts_with_fragment(&text) {
                body = Some(ProtoBlock::from_lines(text, &body_lines));
            }
        }

        [title, subtitle, body].into_iter().flatten().collect()
    }
}
