//! Knowledge-base chunks
//!
//! Chunks are produced by an external ingestion step and written to a JSON
//! array. They are read once at startup and never mutated afterwards.

use crate::error::{Result, WikiRagError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Category assigned to chunks that were ingested without one
pub const DEFAULT_CATEGORY: &str = "General";

/// Immutable unit of indexed text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Chunk text
    #[serde(alias = "text")]
    pub content: String,

    /// Origin document identifier (e.g. `setup_local.md`)
    pub source: String,

    /// Section or document label
    pub title: String,

    /// Classification tag
    #[serde(default = "default_category")]
    pub category: String,
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

impl Chunk {
    pub fn new(
        content: impl Into<String>,
        source: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            content: content.into(),
            source: source.into(),
            title: title.into(),
            category: default_category(),
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }
}

/// Load chunks from a JSON file
///
/// An empty array is a valid (empty) corpus. A missing or unparseable file is
/// an initialization failure.
pub fn load_chunks(path: &Path) -> Result<Vec<Chunk>> {
    if !path.exists() {
        return Err(WikiRagError::Corpus(format!(
            "Chunks file not found: {}",
            path.display()
        )));
    }

    let content = std::fs::read_to_string(path).map_err(|e| WikiRagError::Io {
        source: e,
        context: format!("Failed to read chunks file: {:?}", path),
    })?;

    let chunks: Vec<Chunk> = serde_json::from_str(&content).map_err(|e| WikiRagError::Json {
        source: e,
        context: format!("Failed to parse chunks file: {:?}", path),
    })?;

    tracing::info!("Loaded {} chunks from {}", chunks.len(), path.display());

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_chunks_with_aliases_and_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("chunks.json");
        std::fs::write(
            &path,
            r#"[
                {"content": "Install Rust first", "source": "setup.md", "title": "Setup", "category": "setup"},
                {"text": "We use PostgreSQL", "source": "architecture.md", "title": "Database"}
            ]"#,
        )
        .unwrap();

        let chunks = load_chunks(&path).unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].category, "setup");
        assert_eq!(chunks[1].content, "We use PostgreSQL");
        assert_eq!(chunks[1].category, DEFAULT_CATEGORY);
    }

    #[test]
    fn test_empty_corpus_is_valid() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("chunks.json");
        std::fs::write(&path, "[]").unwrap();

        assert!(load_chunks(&path).unwrap().is_empty());
    }

    #[test]
    fn test_missing_file_fails() {
        let temp = TempDir::new().unwrap();
        assert!(load_chunks(&temp.path().join("nope.json")).is_err());
    }
}
