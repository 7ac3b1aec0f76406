//! Layout reconstruction pipeline.
//!
//! Each page runs through the same stages: run collection, region
//! detection, exclusion of region text, column segmentation, paragraph
//! assembly, classification and relationship mapping. Cross-page stages
//! (header/footer removal, feature enrichment, statistics) run in the
//! [`DocumentAssembler`] once every page is done.

pub mod assembler;
pub mod classify;
pub mod cleanup;
pub mod collector;
pub mod columns;
pub mod exclusion;
pub mod features;
pub mod join;
pub mod noise;
pub mod options;
pub mod page;
pub mod paragraphs;
pub mod regions;
pub mod relationships;
pub mod titles;

pub use assembler::DocumentAssembler;
pub use classify::{ClassifierConfig, TextTypeClassifier};
pub use collector::{CollectorConfig, FontHistogram, RunCollector, TextRun};
pub use columns::{segment_columns, ColumnConfig};
pub use exclusion::{filter_runs, is_excluded, ExclusionConfig};
pub use features::FeatureExtractor;
pub use join::{join_columns, JoinConfig};
pub use noise::{reduce_noise, NoiseConfig};
pub use options::ExtractOptions;
pub use page::{PageProcessor, PageResult};
pub use paragraphs::{ParagraphAssembler, ParagraphConfig, ProtoBlock};
pub use regions::{
    ChartDetector, ChartDetectorConfig, ImageClassifier, ImageClassifierConfig, TableDetector,
    TableDetectorConfig,
};
pub use relationships::{FootnoteMatch, RelationshipConfig, RelationshipMapper};
pub use titles::{TitleConfig, TitleDetector, TitleKind};
