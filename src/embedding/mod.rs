//! Embedding & indexing
//!
//! - `EmbeddingProvider` trait with a FastEmbed implementation (all-MiniLM-L6-v2, 384-dim)
//! - `VectorStore` trait with an HNSW implementation for dense search
//! - `LexicalIndex` (TF-IDF over uni+bi-grams) for sparse search
mod lexical;
mod provider;
mod vector_store;

pub use lexical::{LexicalIndex, LexicalIndexError, SparseVector};
pub use provider::{EmbeddingError, EmbeddingProvider, FastEmbedProvider};
pub use vector_store::{
    ChunkMetadata, HnswVectorStore, VectorQueryResult, VectorStore, VectorStoreError,
};
