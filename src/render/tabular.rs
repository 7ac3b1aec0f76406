//! Flat CSV export of a reconstructed document.
//!
//! Every leaf entity becomes one row: content blocks, table cells and chart
//! data points share a single header and are told apart by `data_type`.
//! Columns that do not apply to a row are left empty.

use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde_json::Value;

use crate::error::{Error, Result};
use crate::geometry::BBox;
use crate::model::{ContentBlock, Document, Figure, LanguageInfo, Table, TableCell};

const BASE_COLUMNS: &[&str] = &[
    "data_type",
    "id",
    "page_number",
    "type",
    "text_type",
    "hierarchy_level",
    "content",
    "parent_id",
    "children_ids",
    "position_x0",
    "position_y0",
    "position_x1",
    "position_y1",
    "font_size",
    "font_weight",
    "alignment",
    "language_code",
    "language_name",
    "language_confidence",
    "writing_system",
    "table_id",
    "figure_id",
    "footnote_ids",
    "is_multi_column",
    "table_caption",
    "table_row",
    "table_column",
    "is_header",
    "table_rows",
    "table_columns",
    "chart_type",
    "series_name",
    "value",
    "unit",
];

/// Feature columns, filled for content blocks that carry features.
const FEATURE_COLUMNS: &[&str] = &[
    "char_count",
    "word_count",
    "sentence_count",
    "token_count",
    "avg_word_length",
    "has_numbers",
    "has_special_chars",
    "has_capitalized_words",
    "ends_with_punctuation",
    "normalized_x0",
    "normalized_y0",
    "normalized_x1",
    "normalized_y1",
    "normalized_center_x",
    "normalized_center_y",
    "relative_to_page_center",
    "relative_page_position",
    "is_first_page",
    "is_last_page",
    "previous_block_type",
    "previous_block_hierarchy",
    "distance_to_previous",
    "next_block_type",
    "next_block_hierarchy",
    "distance_to_next",
    "section_block_count",
    "section_position",
    "font_weight_bold",
    "alignment_left",
    "alignment_center",
    "alignment_right",
    "is_title",
    "is_heading",
    "is_paragraph",
    "has_table",
    "has_figure",
    "has_footnotes",
    "footnote_count",
    "writing_system_ltr",
    "writing_system_rtl",
];

/// Header of the export, in column order.
pub fn csv_header() -> Vec<&'static str> {
    BASE_COLUMNS.iter().chain(FEATURE_COLUMNS).copied().collect()
}

/// One row under construction.
#[derive(Default)]
struct Row {
    fields: HashMap<&'static str, String>,
}

impl Row {
    fn new(data_type: &str, id: impl Into<String>, page_number: u32, kind: &str) -> Self {
        let mut row = Self::default();
        row.set("data_type", data_type);
        row.set("id", id.into());
        row.set("page_number", page_number);
        row.set("type", kind);
        row
    }

    fn set(&mut self, column: &'static str, value: impl ToString) {
        self.fields.insert(column, value.to_string());
    }

    fn set_position(&mut self, bbox: &BBox) {
        self.set("position_x0", bbox.x0);
        self.set("position_y0", bbox.y0);
        self.set("position_x1", bbox.x1);
        self.set("position_y1", bbox.y1);
    }

    fn set_language(&mut self, language: &LanguageInfo) {
        self.set("language_code", &language.code);
        self.set("language_name", &language.name);
        self.set("language_confidence", language.confidence);
        self.set("writing_system", language.writing_system.as_str());
    }

    fn into_record(mut self, header: &[&'static str]) -> Vec<String> {
        header
            .iter()
            .map(|column| self.fields.remove(column).unwrap_or_default())
            .collect()
    }
}

fn block_row(block: &ContentBlock) -> Result<Row> {
    let mut row = Row::new("content_block", &block.id, block.page_number, &block.block_type);
    row.set("text_type", block.text_type);
    row.set("hierarchy_level", block.hierarchy_level);
    row.set("content", &block.content);
    row.set("parent_id", block.parent_id.as_deref().unwrap_or_default());
    row.set("children_ids", block.children_ids.join(","));
    row.set_position(&block.position);

    if let Some(size) = block.styling.font_size {
        row.set("font_size", size);
    }
    row.set("font_weight", if block.is_bold() { "bold" } else { "normal" });
    row.set("alignment", block.styling.alignment.as_str());
    row.set_language(&block.language);

    let relationships = &block.relationships;
    row.set("table_id", relationships.table_id.as_deref().unwrap_or_default());
    row.set("figure_id", relationships.figure_id.as_deref().unwrap_or_default());
    row.set("footnote_ids", relationships.footnote_ids.join(","));
    row.set("is_multi_column", block.is_multi_column);

    if let Some(features) = &block.ml_features {
        let value = serde_json::to_value(features).map_err(|e| Error::Export(e.to_string()))?;
        for column in FEATURE_COLUMNS {
            row.set(*column, scalar(value.get(*column)));
        }
    }
    Ok(row)
}

fn cell_row(table: &Table, cell: &TableCell) -> Row {
    let id = format!("{}_cell_{}_{}", table.id, cell.row, cell.column);
    let mut row = Row::new("table_cell", id, table.page_number, "table");
    row.set("content", &cell.content);
    row.set("parent_id", &table.id);
    row.set_position(&table.position);
    row.set_language(&cell.language);
    row.set("table_id", &table.id);
    row.set("is_multi_column", false);
    row.set("table_caption", table.caption.as_deref().unwrap_or_default());
    row.set("table_row", cell.row);
    row.set("table_column", cell.column);
    row.set("is_header", cell.is_header);
    row.set("table_rows", table.structure.rows);
    row.set("table_columns", table.structure.columns);
    row
}

fn chart_rows(figure: &Figure) -> Vec<Row> {
    let Some(data) = &figure.chart_data else {
        return Vec::new();
    };
    let mut rows = Vec::new();
    for series in &data.series {
        for (index, point) in series.data_points.iter().enumerate() {
            let id = format!("{}_{}_point_{}", figure.id, series.name, index);
            let mut row = Row::new("chart_data", id, figure.page_number, "chart");
            row.set("content", &point.text_context);
            row.set("parent_id", &figure.id);
            row.set_position(&figure.position);
            row.set("figure_id", &figure.id);
            row.set("is_multi_column", false);
            row.set("chart_type", &data.chart_type);
            row.set("series_name", &series.name);
            row.set("value", point.value);
            row.set("unit", &point.unit);
            rows.push(row);
        }
    }
    rows
}

fn scalar(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Write the export to `writer`. Returns the number of data rows.
pub fn write_csv<W: Write>(doc: &Document, writer: W) -> Result<usize> {
    let header = csv_header();
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(&header)?;

    let mut count = 0;
    for page in &doc.pages {
        for block in &page.content_blocks {
            csv.write_record(block_row(block)?.into_record(&header))?;
            count += 1;
        }
    }
    for page in &doc.pages {
        for table in &page.tables {
            for cell in &table.data {
                csv.write_record(cell_row(table, cell).into_record(&header))?;
                count += 1;
            }
        }
    }
    for page in &doc.pages {
        for figure in &page.figures {
            for row in chart_rows(figure) {
                csv.write_record(row.into_record(&header))?;
                count += 1;
            }
        }
    }

    csv.flush()?;
    log::debug!("CSV export: {} rows", count);
    Ok(count)
}

/// Render the export to a string.
pub fn to_csv_string(doc: &Document) -> Result<String> {
    let mut buffer = Vec::new();
    write_csv(doc, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| Error::Export(e.to_string()))
}

/// Write the export to a file. Returns the number of data rows.
pub fn write_csv_file<P: AsRef<Path>>(doc: &Document, path: P) -> Result<usize> {
    let file = File::create(path)?;
    write_csv(doc, file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ChartAxes, ChartData, ChartSeries, DataPoint, FigureKind, MlFeatures, Page, Role};

    fn make_document() -> Document {
        let mut page = Page::new(1, 600.0, 800.0);
        let mut block = ContentBlock::new(
            ContentBlock::make_id(1, 0),
            1,
            Role::Heading,
            "Results, in brief",
            BBox::new(50.0, 60.0, 300.0, 75.0),
        );
        block.children_ids = vec!["page_1_block_1".into(), "page_1_block_2".into()];
        block.ml_features = Some(MlFeatures {
            word_count: 3,
            previous_block_type: None,
            next_block_type: Some(Role::Paragraph),
            ..Default::default()
        });
        page.content_blocks.push(block);

        let rows = vec![vec!["Region".to_string(), "Value".to_string()], vec!["North".to_string(), "12".to_string()]];
        page.tables.push(Table::from_grid(
            Table::make_id(1, 0),
            1,
            BBox::new(50.0, 400.0, 300.0, 500.0),
            &rows,
            |_| LanguageInfo::unknown(),
        ));

        page.figures.push(Figure {
            id: Figure::make_id(1, 0),
            page_number: 1,
            kind: FigureKind::Chart,
            chart_type: Some("bar".into()),
            caption: None,
            position: BBox::new(50.0, 550.0, 300.0, 750.0),
            file_path: None,
            format: None,
            embedded_text: vec![],
            components: None,
            chart_data: Some(ChartData {
                chart_type: "bar".into(),
                series: vec![ChartSeries {
                    name: "2023".into(),
                    data_points: vec![DataPoint {
                        value: 4.5,
                        unit: "percentage".into(),
                        text_context: "2023 4.5%".into(),
                    }],
                }],
                axes: ChartAxes::default(),
                extraction_method: "embedded_text".into(),
                confidence: 0.6,
            }),
            data: vec![],
        });

        let mut doc = Document::new();
        doc.add_page(page);
        doc
    }

    fn records(csv: &str) -> Vec<HashMap<String, String>> {
        let mut reader = csv::Reader::from_reader(csv.as_bytes());
        let header: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
        reader
            .records()
            .map(|r| {
                let r = r.unwrap();
                header.iter().cloned().zip(r.iter().map(String::from)).collect()
            })
            .collect()
    }

    #[test]
    fn test_rows_per_entity() {
        let csv = to_csv_string(&make_document()).unwrap();
        let rows = records(&csv);

        assert_eq!(rows.len(), 1 + 4 + 1);
        assert_eq!(rows[0]["data_type"], "content_block");
        assert_eq!(rows[1]["data_type"], "table_cell");
        assert_eq!(rows[5]["data_type"], "chart_data");
    }

    #[test]
    fn test_content_block_row() {
        let rows = records(&to_csv_string(&make_document()).unwrap());
        let block = &rows[0];
        assert_eq!(block["id"], "page_1_block_0");
        assert_eq!(block["text_type"], "heading");
        assert_eq!(block["hierarchy_level"], "2");
        assert_eq!(block["content"], "Results, in brief");
        assert_eq!(block["children_ids"], "page_1_block_1,page_1_block_2");
        assert_eq!(block["position_x0"], "50");
        assert_eq!(block["word_count"], "3");
        assert_eq!(block["previous_block_type"], "");
        assert_eq!(block["next_block_type"], "paragraph");
        assert_eq!(block["table_row"], "");
    }

    #[test]
    fn test_cell_and_chart_rows() {
        let rows = records(&to_csv_string(&make_document()).unwrap());
        let cell = &rows[3];
        assert_eq!(cell["id"], "page_1_table_0_cell_1_0");
        assert_eq!(cell["content"], "North");
        assert_eq!(cell["is_header"], "false");
        assert_eq!(cell["table_rows"], "2");
        assert_eq!(cell["word_count"], "");

        let point = &rows[5];
        assert_eq!(point["figure_id"], "page_1_figure_0");
        assert_eq!(point["series_name"], "2023");
        assert_eq!(point["value"], "4.5");
        assert_eq!(point["unit"], "percentage");
    }

    #[test]
    fn test_header_has_no_duplicates() {
        let header = csv_header();
        let mut unique = header.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), header.len());
    }
}
