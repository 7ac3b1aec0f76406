//! JSON artifact for reconstructed documents.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::Document;

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

#[derive(Serialize)]
struct ArtifactRef<'a> {
    document: &'a Document,
}

#[derive(Deserialize)]
struct Artifact {
    document: Document,
}

/// Convert a document to the JSON artifact, `{"document": {...}}`.
pub fn to_json(doc: &Document, format: JsonFormat) -> Result<String> {
    let artifact = ArtifactRef { document: doc };
    let result = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(&artifact),
        JsonFormat::Compact => serde_json::to_string(&artifact),
    };

    result.map_err(|e| Error::Render(format!("JSON serialization error: {}", e)))
}

/// Write the JSON artifact to `path`.
pub fn write_json<P: AsRef<Path>>(doc: &Document, path: P, format: JsonFormat) -> Result<()> {
    let json = to_json(doc, format)?;
    fs::write(path, json)?;
    Ok(())
}

/// Read a document back from its JSON artifact.
pub fn from_json(json: &str) -> Result<Document> {
    let artifact: Artifact =
        serde_json::from_str(json).map_err(|e| Error::Render(format!("JSON parse error: {}", e)))?;
    Ok(artifact.document)
}
