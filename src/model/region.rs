//! Non-flowing regions of a page: tables, images and figures.

use serde::{Deserialize, Serialize};

use super::LanguageInfo;
use crate::geometry::BBox;

/// Shape summary of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TableStructure {
    pub rows: usize,
    pub columns: usize,
    pub has_header: bool,
}

/// A single non-empty table cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableCell {
    /// Row index (0-based)
    pub row: usize,
    /// Column index (0-based)
    pub column: usize,
    pub content: String,
    pub language: LanguageInfo,
    /// Whether the cell belongs to the header row
    pub is_header: bool,
    /// Span information, when the grid source reports it
    pub merged_cells: Option<String>,
}

/// A table region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// `page_{n}_table_{k}`
    pub id: String,
    pub page_number: u32,
    /// Caption text, filled in by the relationship mapper
    pub caption: Option<String>,
    pub position: BBox,
    pub structure: TableStructure,
    pub data: Vec<TableCell>,
}

impl Table {
    pub fn make_id(page_number: u32, index: usize) -> String {
        format!("page_{}_table_{}", page_number, index)
    }

    /// Build a table from a dense grid of cell strings.
    ///
    /// Empty cells are dropped from `data` but still count toward the
    /// structure. The first row is a header when the table has more than
    /// one row and more than 70% of its first-row cells are filled.
    pub fn from_grid(
        id: String,
        page_number: u32,
        position: BBox,
        rows: &[Vec<String>],
        mut language_of: impl FnMut(&str) -> LanguageInfo,
    ) -> Self {
        let row_count = rows.len();
        let column_count = rows.iter().map(|r| r.len()).max().unwrap_or(0);

        let has_header = row_count > 1
            && rows.first().is_some_and(|first| {
                let filled = first.iter().filter(|c| !c.trim().is_empty()).count();
                column_count > 0 && filled as f32 / column_count as f32 > 0.7
            });

        let mut data = Vec::new();
        for (row_idx, row) in rows.iter().enumerate() {
            for (col_idx, cell) in row.iter().enumerate() {
                let content = cell.trim();
                if content.is_empty() {
                    continue;
                }
                data.push(TableCell {
                    row: row_idx,
                    column: col_idx,
                    content: content.to_string(),
                    language: language_of(content),
                    is_header: has_header && row_idx == 0,
                    merged_cells: None,
                });
            }
        }

        Self {
            id,
            page_number,
            caption: None,
            position,
            structure: TableStructure {
                rows: row_count,
                columns: column_count,
                has_header,
            },
            data,
        }
    }

    /// Cell content at `(row, column)`, if the cell is non-empty.
    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.data
            .iter()
            .find(|c| c.row == row && c.column == column)
            .map(|c| c.content.as_str())
    }
}

/// A text run found over or next to an image or figure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedText {
    pub text: String,
    pub position: BBox,
    /// Offset of the run's top-left corner from the region's top-left corner
    pub relative_position: RelativePosition,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RelativePosition {
    pub x: f32,
    pub y: f32,
}

/// Classification of a small raster image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageKind {
    Logo,
    Photograph,
}

/// A raster image that is not large enough to be a figure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    /// `page_{n}_image_{k}`
    pub id: String,
    pub page_number: u32,
    #[serde(rename = "type")]
    pub kind: ImageKind,
    pub caption: Option<String>,
    pub position: BBox,
    /// Set once the bytes are written to disk
    pub file_path: Option<String>,
    /// File extension of the encoded bytes (`jpeg`, `jp2`, `raw`)
    pub format: String,
    pub embedded_text: Vec<EmbeddedText>,
    #[serde(skip)]
    pub data: Vec<u8>,
}

impl Image {
    pub fn make_id(page_number: u32, index: usize) -> String {
        format!("page_{}_image_{}", page_number, index)
    }
}

/// Classification of a figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FigureKind {
    Chart,
    Diagram,
}

/// Text found inside a chart, sorted by the part of the chart it belongs to.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChartComponents {
    pub title: Option<String>,
    pub axis_labels: Vec<String>,
    pub legend: Vec<String>,
    pub data_labels: Vec<String>,
    /// Every text run inside the chart region, in reading order
    pub internal_text: Vec<String>,
}

/// A single numeric value read from a chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub value: f64,
    pub unit: String,
    pub text_context: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub name: String,
    pub data_points: Vec<DataPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChartAxes {
    pub has_horizontal_axis: bool,
    pub has_vertical_axis: bool,
}

/// Structured values recovered from a chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub chart_type: String,
    pub series: Vec<ChartSeries>,
    pub axes: ChartAxes,
    pub extraction_method: String,
    pub confidence: f32,
}

/// A figure: a large image or a vector-drawn chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Figure {
    /// `page_{n}_figure_{k}`
    pub id: String,
    pub page_number: u32,
    #[serde(rename = "type")]
    pub kind: FigureKind,
    pub chart_type: Option<String>,
    pub caption: Option<String>,
    pub position: BBox,
    pub file_path: Option<String>,
    /// Extension of the encoded bytes; `None` for vector figures
    pub format: Option<String>,
    pub embedded_text: Vec<EmbeddedText>,
    pub components: Option<ChartComponents>,
    pub chart_data: Option<ChartData>,
    #[serde(skip)]
    pub data: Vec<u8>,
}

impl Figure {
    pub fn make_id(page_number: u32, index: usize) -> String {
        format!("page_{}_figure_{}", page_number, index)
    }

    /// Whether the figure carries raster bytes.
    pub fn has_image_data(&self) -> bool {
        !self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(data: &[&[&str]]) -> Vec<Vec<String>> {
        data.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_table_from_grid_with_header() {
        let grid = rows(&[&["Region", "2023", "2024"], &["North", "10", ""], &["South", "12", "14"]]);
        let table = Table::from_grid(
            Table::make_id(1, 0),
            1,
            BBox::new(0.0, 0.0, 100.0, 60.0),
            &grid,
            |_| LanguageInfo::unknown(),
        );

        assert_eq!(table.id, "page_1_table_0");
        assert_eq!(table.structure.rows, 3);
        assert_eq!(table.structure.columns, 3);
        assert!(table.structure.has_header);
        assert_eq!(table.data.len(), 8);
        assert_eq!(table.cell(2, 2), Some("14"));
        assert_eq!(table.cell(1, 2), None);
        assert!(table.data.iter().filter(|c| c.row == 0).all(|c| c.is_header));
        assert!(table.data.iter().filter(|c| c.row > 0).all(|c| !c.is_header));
    }

    #[test]
    fn test_sparse_first_row_is_not_header() {
        let grid = rows(&[&["Only", "", ""], &["a", "b", "c"]]);
        let table = Table::from_grid("t".into(), 1, BBox::default(), &grid, |_| LanguageInfo::unknown());
        assert!(!table.structure.has_header);
    }

    #[test]
    fn test_single_row_is_not_header() {
        let grid = rows(&[&["a", "b"]]);
        let table = Table::from_grid("t".into(), 1, BBox::default(), &grid, |_| LanguageInfo::unknown());
        assert!(!table.structure.has_header);
    }

    #[test]
    fn test_figure_skips_raw_bytes_in_json() {
        let figure = Figure {
            id: Figure::make_id(3, 1),
            page_number: 3,
            kind: FigureKind::Chart,
            chart_type: None,
            caption: None,
            position: BBox::default(),
            file_path: None,
            format: Some("png".into()),
            embedded_text: vec![],
            components: None,
            chart_data: None,
            data: vec![1, 2, 3],
        };
        let value = serde_json::to_value(&figure).unwrap();
        assert_eq!(value["type"], "chart");
        assert!(value.get("data").is_none());
        assert!(figure.has_image_data());
    }
}
