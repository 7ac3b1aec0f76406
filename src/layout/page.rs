//! Per-page processing: primitives in, reconstructed page out.

use super::classify::TextTypeClassifier;
use super::collector::{FontHistogram, RunCollector, TextRun};
use super::columns::segment_columns;
use super::exclusion::filter_runs;
use super::join::join_columns;
use super::options::ExtractOptions;
use super::paragraphs::{ParagraphAssembler, ProtoBlock};
use super::regions::{embedded_text, overlaps_any, ChartCandidate, ChartDetector, ImageClassifier, TableDetector};
use super::relationships::RelationshipMapper;
use super::titles::TitleDetector;
use crate::geometry::{round2, BBox};
use crate::language::{annotate, LanguageDetector, LanguageStats};
use crate::model::{
    Alignment, ChartAxes, ContentBlock, Figure, FigureKind, FontWeight, Page, Styling,
};
use crate::source::PageSource;

/// Chart candidates overlapping a table by this ratio are dropped.
const CHART_TABLE_OVERLAP: f32 = 0.5;

/// Output of one page: the page plus the accumulators the document
/// assembler merges.
#[derive(Debug, Clone)]
pub struct PageResult {
    pub page: Page,
    pub fonts: FontHistogram,
    pub languages: LanguageStats,
}

/// Runs the layout pipeline on a single page.
///
/// The processor holds no per-page state, so one instance can serve pages
/// on several threads at once.
pub struct PageProcessor {
    options: ExtractOptions,
    collector: RunCollector,
    tables: TableDetector,
    charts: ChartDetector,
    images: ImageClassifier,
    paragraphs: ParagraphAssembler,
    classifier: TextTypeClassifier,
    mapper: RelationshipMapper,
    detector: Box<dyn LanguageDetector>,
}

impl PageProcessor {
    pub fn new(options: ExtractOptions, detector: Box<dyn LanguageDetector>) -> Self {
        Self {
            collector: RunCollector::with_config(options.collector.clone()),
            tables: TableDetector::with_config(options.tables.clone()),
            charts: ChartDetector::with_config(options.charts.clone()),
            images: ImageClassifier::with_config(options.images.clone()),
            paragraphs: ParagraphAssembler::new(
                options.paragraphs.clone(),
                TitleDetector::with_config(options.titles.clone()),
            ),
            classifier: TextTypeClassifier::with_config(options.classifier.clone()),
            mapper: RelationshipMapper::with_config(options.relationships.clone()),
            detector,
            options,
        }
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    pub fn mapper(&self) -> &RelationshipMapper {
        &self.mapper
    }

    pub fn detector(&self) -> &dyn LanguageDetector {
        self.detector.as_ref()
    }

    /// Reconstruct one page.
    pub fn process<S: PageSource + ?Sized>(&self, source: &S) -> PageResult {
        let number = source.page_number();
        let (width, height) = source.size();
        let mut page = Page::new(number, round2(width), round2(height));

        let (runs, fonts) = self.collector.collect(source.text_runs(), width, height);
        let primitives = source.vector_primitives();
        let detector = self.detector.as_ref();

        // Step 1: regions
        page.tables = self.tables.detect(
            number,
            (width, height),
            &source.table_grids(),
            &primitives.lines,
            &runs,
            self.options.text_tables,
            |text| annotate(detector, text),
        );
        let table_regions: Vec<BBox> = page.tables.iter().map(|t| t.position).collect();

        let charts: Vec<ChartCandidate> = if self.options.extract_charts {
            self.charts
                .detect(&primitives, width, height)
                .into_iter()
                .filter(|chart| !overlaps_any(&chart.bbox, &table_regions, CHART_TABLE_OVERLAP))
                .collect()
        } else {
            Vec::new()
        };

        let (images, mut figures) = self.images.classify(number, source.images(), &runs, width, height);
        if self.options.extract_charts {
            for figure in figures.iter_mut().filter(|f| f.kind == FigureKind::Chart) {
                let texts: Vec<String> = figure.embedded_text.iter().map(|t| t.text.clone()).collect();
                figure.chart_data = self.charts.chart_data(&texts, "unknown", ChartAxes::default());
                figure.chart_type = figure.chart_data.as_ref().map(|d| d.chart_type.clone());
            }
        }
        for chart in &charts {
            let figure = self.vector_figure(number, figures.len(), chart, &runs);
            figures.push(figure);
        }
        page.images = images;
        page.figures = figures;

        // Step 2: flow text
        let regions: Vec<BBox> = table_regions
            .iter()
            .copied()
            .chain(charts.iter().map(|c| c.bbox))
            .chain(page.images.iter().map(|i| i.position))
            .chain(page.figures.iter().map(|f| f.position))
            .collect();
        let (flow, _) = filter_runs(runs, &regions, &self.options.exclusion);

        let baseline = fonts.mode();
        let columns: Vec<Vec<ProtoBlock>> = segment_columns(flow, &self.options.columns)
            .iter()
            .map(|column| {
                let mut blocks = self.paragraphs.assemble(column);
                for block in &mut blocks {
                    block.role = self.classifier.classify(
                        &block.text,
                        block.font_size,
                        block.bold,
                        &block.bbox,
                        height,
                        baseline,
                    );
                }
                blocks
            })
            .collect();
        let column_count = columns.len();

        let protos = if self.options.join_columns {
            join_columns(columns, &self.options.join)
        } else {
            columns.into_iter().flatten().collect()
        };

        // Step 3: blocks
        let mut languages = LanguageStats::new();
        for (index, proto) in protos.into_iter().enumerate() {
            let position = proto.bbox.clamp(width, height).rounded();
            let language = annotate(detector, &proto.text);
            languages.record(&language);

            let mut block = ContentBlock::new(
                ContentBlock::make_id(number, index),
                number,
                proto.role,
                proto.text,
                position,
            )
            .with_styling(Styling {
                font_size: Some(round2(proto.font_size)),
                font_weight: if proto.bold { FontWeight::Bold } else { FontWeight::Normal },
                alignment: Alignment::detect(position.x0, position.x1, width),
            })
            .with_language(language);
            block.is_multi_column = proto.is_multi_column;
            page.content_blocks.push(block);
        }

        // Step 4: relationships
        self.mapper.map_page(&mut page);

        log::debug!(
            "Page {}: {} columns, {} blocks, {} tables, {} images, {} figures",
            number,
            column_count,
            page.content_blocks.len(),
            page.tables.len(),
            page.images.len(),
            page.figures.len()
        );

        PageResult {
            page,
            fonts,
            languages,
        }
    }

    fn vector_figure(&self, page_number: u32, index: usize, chart: &ChartCandidate, runs: &[TextRun]) -> Figure {
        let components = self.charts.components(&chart.bbox, runs);
        let embedded = embedded_text(&chart.bbox, runs, self.images.config().embedded_text_margin);
        let texts: Vec<String> = embedded.iter().map(|t| t.text.clone()).collect();
        let chart_data = self.charts.chart_data(&texts, &chart.chart_type, chart.axes);

        Figure {
            id: Figure::make_id(page_number, index),
            page_number,
            kind: FigureKind::Chart,
            chart_type: Some(chart.chart_type.clone()),
            caption: None,
            position: chart.bbox.rounded(),
            file_path: None,
            format: None,
            embedded_text: embedded,
            components: Some(components),
            chart_data,
            data: Vec::new(),
        }
    }
}
