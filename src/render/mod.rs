//! Output artifacts for reconstructed documents.
//!
//! Two writers share the same [`Document`](crate::model::Document): the
//! JSON artifact (`{"document": {...}}`) and a flat CSV export with one row
//! per content block, table cell and chart data point.

mod json;
mod tabular;

pub use json::{from_json, to_json, write_json, JsonFormat};
pub use tabular::{csv_header, to_csv_string, write_csv, write_csv_file};
