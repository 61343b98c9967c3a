//! Hybrid retrieval & reranking
//!
//! Dense (vector) and sparse (TF-IDF) retrieval run side by side, their hits
//! are fused by weighted score with `(source, title)` deduplication, and an
//! optional cross-encoder pass reorders the fused shortlist.

mod candidate;
mod dense;
mod fusion;
mod hybrid;
mod reranker;
mod sparse;

pub use candidate::{Candidate, FusionKey, Method};
pub use dense::{distance_to_similarity, DenseRetriever};
pub use fusion::{fuse, shortlist_size, FusionError, FusionWeights};
pub use hybrid::{FusedShortlist, HybridSearcher, SearchError, SearchOutcome};
pub use reranker::{
    sigmoid, CrossEncoder, FastEmbedCrossEncoder, RerankError, Reranker, DEFAULT_MAX_CHARS,
};
pub use sparse::SparseRetriever;
