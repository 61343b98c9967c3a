use crate::embedding::{EmbeddingError, LexicalIndexError, VectorStoreError};
use crate::generation::GenerationError;
use crate::retrieval::{RerankError, SearchError};
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for WikiRAG
#[derive(Error, Debug)]
pub enum WikiRagError {
    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration validation errors
    #[error("Configuration validation failed: {errors:?}")]
    ConfigValidation { errors: Vec<ValidationError> },

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Invalid configuration value
    #[error("Invalid configuration value at {path}: {message}")]
    InvalidConfigValue { path: String, message: String },

    /// Chunk file could not be read or parsed
    #[error("Corpus error: {0}")]
    Corpus(String),

    /// IO errors
    #[error("IO error: {context}: {source}")]
    Io {
        source: std::io::Error,
        context: String,
    },

    /// TOML deserialization errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("TOML serialization error: {0}")]
    TomlSerialization(#[from] toml::ser::Error),

    /// JSON errors
    #[error("JSON error: {context}: {source}")]
    Json {
        source: serde_json::Error,
        context: String,
    },

    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    VectorStore(#[from] VectorStoreError),

    #[error(transparent)]
    LexicalIndex(#[from] LexicalIndexError),

    #[error(transparent)]
    Rerank(#[from] RerankError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Search(#[from] SearchError),

    /// Rejected query input
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// A stage deadline elapsed before the next stage could start
    #[error("Query timed out before stage '{stage}'")]
    Timeout { stage: &'static str },

    /// Generic errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Path to the configuration key that failed validation
    pub path: String,
    /// Error message describing the validation failure
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result type for WikiRAG operations
pub type Result<T> = std::result::Result<T, WikiRagError>;
