//! Extraction options and configuration.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::classify::ClassifierConfig;
use super::collector::CollectorConfig;
use super::columns::ColumnConfig;
use super::exclusion::ExclusionConfig;
use super::join::JoinConfig;
use super::noise::NoiseConfig;
use super::paragraphs::ParagraphConfig;
use super::regions::{ChartDetectorConfig, ImageClassifierConfig, TableDetectorConfig};
use super::relationships::{FootnoteMatch, RelationshipConfig};
use super::titles::TitleConfig;
use crate::error::{Error, Result};

/// Options for reconstructing a document.
///
/// Every field has a default, so a configuration file only needs the
/// values it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractOptions {
    /// Process pages in parallel
    pub parallel: bool,

    /// Detect vector charts and read their components
    pub extract_charts: bool,

    /// Attach per-block feature vectors
    pub ml_features: bool,

    /// Merge paragraphs continuing across a column break
    pub join_columns: bool,

    /// Infer tables from text alignment when no ruling lines exist
    pub text_tables: bool,

    pub collector: CollectorConfig,
    pub tables: TableDetectorConfig,
    pub charts: ChartDetectorConfig,
    pub images: ImageClassifierConfig,
    pub exclusion: ExclusionConfig,
    pub columns: ColumnConfig,
    pub paragraphs: ParagraphConfig,
    pub titles: TitleConfig,
    pub classifier: ClassifierConfig,
    pub relationships: RelationshipConfig,
    pub noise: NoiseConfig,
    pub join: JoinConfig,
}

impl ExtractOptions {
    /// Create new extract options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read options from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::InvalidConfig(e.to_string()))
    }

    /// Read options from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .map_err(|e| Error::InvalidConfig(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }

    /// Enable or disable parallel processing.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Disable parallel processing.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Enable or disable vector chart detection.
    pub fn with_charts(mut self, extract: bool) -> Self {
        self.extract_charts = extract;
        self
    }

    /// Skip vector chart detection.
    pub fn without_charts(self) -> Self {
        self.with_charts(false)
    }

    /// Enable or disable feature enrichment.
    pub fn with_features(mut self, enabled: bool) -> Self {
        self.ml_features = enabled;
        self
    }

    /// Skip feature enrichment.
    pub fn without_features(self) -> Self {
        self.with_features(false)
    }

    /// Enable or disable the column continuation join.
    pub fn with_column_join(mut self, join: bool) -> Self {
        self.join_columns = join;
        self
    }

    /// Enable or disable text-aligned table detection.
    pub fn with_text_tables(mut self, enabled: bool) -> Self {
        self.text_tables = enabled;
        self
    }

    /// Set how numerals are matched to footnotes.
    pub fn with_footnote_match(mut self, mode: FootnoteMatch) -> Self {
        self.relationships.footnote_match = mode;
        self
    }

    /// Set the header/footer reducer configuration.
    pub fn with_noise(mut self, noise: NoiseConfig) -> Self {
        self.noise = noise;
        self
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            extract_charts: true,
            ml_features: true,
            join_columns: true,
            text_tables: true,
            collector: CollectorConfig::default(),
            tables: TableDetectorConfig::default(),
            charts: ChartDetectorConfig::default(),
            images: ImageClassifierConfig::default(),
            exclusion: ExclusionConfig::default(),
            columns: ColumnConfig::default(),
            paragraphs: ParagraphConfig::default(),
            titles: TitleConfig::default(),
            classifier: ClassifierConfig::default(),
            relationships: RelationshipConfig::default(),
            noise: NoiseConfig::default(),
            join: JoinConfig::default(),
        }
    }
}
