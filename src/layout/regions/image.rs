//! Raster image classification.

use serde::{Deserialize, Serialize};

use crate::geometry::BBox;
use crate::layout::collector::TextRun;
use crate::model::{EmbeddedText, Figure, FigureKind, Image, ImageKind, RelativePosition};
use crate::source::ImagePlacement;

/// Image classifier configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageClassifierConfig {
    /// Placements above this share of the page area are figures
    pub figure_area_ratio: f32,
    /// Images below this share of the page area are logos
    pub logo_area_ratio: f32,
    /// Margin around a region when collecting embedded text
    pub embedded_text_margin: f32,
    /// Words in embedded text that make a figure a chart
    pub chart_keywords: Vec<String>,
}

impl Default for ImageClassifierConfig {
    fn default() -> Self {
        Self {
            figure_area_ratio: 0.10,
            logo_area_ratio: 0.05,
            embedded_text_margin: 10.0,
            chart_keywords: ["chart", "graph", "bar", "axis", "percentage", "%"]
                .iter()
                .map(|k| k.to_string())
                .collect(),
        }
    }
}

/// Sorts image placements into figures and plain images.
pub struct ImageClassifier {
    config: ImageClassifierConfig,
}

impl ImageClassifier {
    pub fn new() -> Self {
        Self::with_config(ImageClassifierConfig::default())
    }

    pub fn with_config(config: ImageClassifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ImageClassifierConfig {
        &self.config
    }

    /// Classify the placements of one page.
    ///
    /// Returns `(images, figures)` numbered in placement order.
    pub fn classify(
        &self,
        page_number: u32,
        placements: Vec<ImagePlacement>,
        runs: &[TextRun],
        width: f32,
        height: f32,
    ) -> (Vec<Image>, Vec<Figure>) {
        let page_area = width * height;
        let mut images = Vec::new();
        let mut figures = Vec::new();

        for placement in placements {
            let position = placement.bbox.clamp(width, height);
            let area_ratio = if page_area > 0.0 { position.area() / page_area } else { 0.0 };
            let embedded = embedded_text(&position, runs, self.config.embedded_text_margin);

            if area_ratio > self.config.figure_area_ratio {
                let kind = if self.mentions_chart(&embedded) {
                    FigureKind::Chart
                } else {
                    FigureKind::Diagram
                };
                figures.push(Figure {
                    id: Figure::make_id(page_number, figures.len()),
                    page_number,
                    kind,
                    chart_type: None,
                    caption: None,
                    position: position.rounded(),
                    file_path: None,
                    format: Some(placement.format),
                    embedded_text: embedded,
                    components: None,
                    chart_data: None,
                    data: placement.data,
                });
            } else {
                let kind = if area_ratio < self.config.logo_area_ratio {
                    ImageKind::Logo
                } else {
                    ImageKind::Photograph
                };
                images.push(Image {
                    id: Image::make_id(page_number, images.len()),
                    page_number,
                    kind,
                    caption: None,
                    position: position.rounded(),
                    file_path: None,
                    format: placement.format,
                    embedded_text: embedded,
                    data: placement.data,
                });
            }
        }

        log::debug!(
            "ImageClassifier: page {} -> {} images, {} figures",
            page_number,
            images.len(),
            figures.len()
        );
        (images, figures)
    }

    fn mentions_chart(&self, embedded: &[EmbeddedText]) -> bool {
        embedded.iter().any(|item| {
            let text = item.text.to_lowercase();
            self.config
                .chart_keywords
                .iter()
                .any(|keyword| text.contains(keyword.as_str()))
        })
    }
}

impl Default for ImageClassifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs lying completely inside `region` grown by `margin`, positioned
/// relative to the region's top-left corner.
pub fn embedded_text(region: &BBox, runs: &[TextRun], margin: f32) -> Vec<EmbeddedText> {
    let area = region.expand(margin);
    runs.iter()
        .filter(|run| area.contains(&run.bbox))
        .map(|run| EmbeddedText {
            text: run.text.clone(),
            position: run.bbox.rounded(),
            relative_position: RelativePosition {
                x: crate::geometry::round2(run.bbox.x0 - region.x0),
                y: crate::geometry::round2(run.bbox.y0 - region.y0),
            },
        })
        .collect()
}
