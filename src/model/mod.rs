//! Output data model.
//!
//! This is the structured tree emitted for every document: pages own their
//! content blocks and regions, and blocks refer to each other and to regions
//! only through id strings resolved within the same page.

mod block;
mod document;
mod features;
mod language;
mod page;
mod region;

pub use block::{Alignment, ContentBlock, FontWeight, Relationships, Role, Styling};
pub use document::{Document, LanguageShare, Metadata, WritingSystemShare};
pub use features::MlFeatures;
pub use language::{language_name, LanguageInfo, WritingSystem, UNKNOWN_LANGUAGE};
pub use page::{Dimensions, Page};
pub use region::{
    ChartAxes, ChartComponents, ChartData, ChartSeries, DataPoint, EmbeddedText, Figure,
    FigureKind, Image, ImageKind, RelativePosition, Table, TableCell, TableStructure,
};
