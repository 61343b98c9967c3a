//! Scored retrieval hits and their fusion key

use crate::corpus::Chunk;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which retrieval signal(s) produced a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    Dense,
    Sparse,
    /// Found by both retrievers
    Hybrid,
    /// Found only by the sparse retriever during fusion
    SparseOnly,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Dense => "dense",
            Method::Sparse => "sparse",
            Method::Hybrid => "hybrid",
            Method::SparseOnly => "sparse_only",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deduplication key: one candidate per `(source, title)` within a result set
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FusionKey {
    pub source: String,
    pub title: String,
}

/// A scored retrieval hit, owned by a single query execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub content: String,
    pub source: String,
    pub title: String,
    pub category: String,

    /// Stage-dependent score: retriever similarity, then fused score, then
    /// normalized rerank score
    pub relevance: f32,

    /// Weighted fusion score (zero until fused)
    pub hybrid_score: f32,

    pub method: Method,

    /// Set once the cross-encoder has re-scored this candidate
    pub reranked: bool,
}

impl Candidate {
    pub fn new(
        content: impl Into<String>,
        source: impl Into<String>,
        title: impl Into<String>,
        category: impl Into<String>,
        relevance: f32,
        method: Method,
    ) -> Self {
        Self {
            content: content.into(),
            source: source.into(),
            title: title.into(),
            category: category.into(),
            relevance,
            hybrid_score: 0.0,
            method,
            reranked: false,
        }
    }

    /// Candidate for a corpus chunk
    pub fn from_chunk(chunk: &Chunk, relevance: f32, method: Method) -> Self {
        Self::new(
            chunk.content.clone(),
            chunk.source.clone(),
            chunk.title.clone(),
            chunk.category.clone(),
            relevance,
            method,
        )
    }

    pub fn fusion_key(&self) -> FusionKey {
        FusionKey {
            source: self.source.clone(),
            title: self.title.clone(),
        }
    }

    /// Method tag as reported to callers, e.g. `hybrid+rerank`
    pub fn method_label(&self) -> String {
        if self.reranked {
            format!("{}+rerank", self.method)
        } else {
            self.method.to_string()
        }
    }

    /// Get a short preview of the content (first N characters)
    pub fn preview(&self, max_chars: usize) -> String {
        match self.content.char_indices().nth(max_chars) {
            Some((byte_idx, _)) => format!("{}...", &self.content[..byte_idx]),
            None => self.content.clone(),
        }
    }
}
