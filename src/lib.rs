//! WikiRAG - Hybrid retrieval and ranking for wiki question answering
//!
//! Retrieves knowledge-base passages by combining dense (embedding) and
//! sparse (TF-IDF) similarity, fuses and deduplicates the hits, reranks the
//! shortlist with a cross-encoder, and hands the ranked context to a
//! language model for a grounded answer.

pub mod cli;
pub mod config;
pub mod corpus;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod evaluation;
pub mod generation;
pub mod retrieval;

pub use engine::{QueryEngine, QueryOptions, QueryResponse};
pub use error::{Result, WikiRagError};
