/// Vector store abstraction and HNSW-backed implementation
use super::{EmbeddingError, EmbeddingProvider};
use crate::config::IndexingConfig;
use crate::corpus::Chunk;
use hnsw_rs::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound on HNSW layers supported by hnsw_rs
const MAX_LAYERS: usize = 16;

#[derive(Error, Debug)]
pub enum VectorStoreError {
    #[error("Index initialization failed: {0}")]
    InitializationError(String),

    #[error("Invalid dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    #[error("Embedding failed while building the store: {0}")]
    Embedding(#[from] EmbeddingError),
}

/// Metadata stored alongside every vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub source: String,
    pub title: String,
    pub category: String,
}

impl From<&Chunk> for ChunkMetadata {
    fn from(chunk: &Chunk) -> Self {
        Self {
            source: chunk.source.clone(),
            title: chunk.title.clone(),
            category: chunk.category.clone(),
        }
    }
}

/// Columnar nearest-neighbour response
///
/// The three columns are parallel; `documents[i]`, `metadatas[i]` and
/// `distances[i]` describe the same hit. Consumers must not assume the
/// columns have equal length without checking.
#[derive(Debug, Clone, Default)]
pub struct VectorQueryResult {
    pub documents: Vec<String>,
    pub metadatas: Vec<ChunkMetadata>,
    pub distances: Vec<f32>,
}

impl VectorQueryResult {
    /// Whether all columns have the same length
    pub fn is_consistent(&self) -> bool {
        self.documents.len() == self.metadatas.len() && self.metadatas.len() == self.distances.len()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Nearest-neighbour search over chunk embeddings
///
/// Distances must follow the cosine-distance convention `1 - cos(a, b)`,
/// i.e. lie in `[0, 2]` with `0` meaning identical direction.
pub trait VectorStore: Send + Sync {
    /// Return up to `k` nearest chunks to `vector`, nearest first
    fn query(&self, vector: &[f32], k: usize) -> Result<VectorQueryResult, VectorStoreError>;

    /// Number of stored chunks
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// HNSW vector store
///
/// Holds the chunk table and an approximate nearest-neighbour index built
/// over its embeddings. Read-only after construction.
pub struct HnswVectorStore {
    index: Hnsw<'static, f32, DistCosine>,
    chunks: Vec<Chunk>,
    dimension: usize,
    ef_search: usize,
}

impl HnswVectorStore {
    /// Create an empty store
    pub fn new(dimension: usize, capacity: usize, config: &IndexingConfig) -> Self {
        let index = Hnsw::<f32, DistCosine>::new(
            config.hnsw_m,
            capacity.max(1),
            MAX_LAYERS,
            config.hnsw_ef_construction,
            DistCosine,
        );

        Self {
            index,
            chunks: Vec::with_capacity(capacity),
            dimension,
            ef_search: config.hnsw_ef_search,
        }
    }

    /// Embed every chunk with `provider` and index it
    ///
    /// Chunks with blank content cannot be embedded and are skipped.
    pub fn build(
        chunks: &[Chunk],
        provider: &dyn EmbeddingProvider,
        config: &IndexingConfig,
        batch_size: usize,
    ) -> Result<Self, VectorStoreError> {
        if provider.dimension() != config.vector_dim {
            return Err(VectorStoreError::InvalidDimension {
                expected: config.vector_dim,
                actual: provider.dimension(),
            });
        }

        let indexable: Vec<&Chunk> = chunks
            .iter()
            .filter(|c| !c.content.trim().is_empty())
            .collect();

        if indexable.len() < chunks.len() {
            tracing::warn!(
                "Skipping {} chunks with empty content",
                chunks.len() - indexable.len()
            );
        }

        let mut store = Self::new(config.vector_dim, indexable.len(), config);

        for batch in indexable.chunks(batch_size.max(1)) {
            let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
            let embeddings = provider.embed_batch(&texts)?;

            if embeddings.len() != batch.len() {
                return Err(VectorStoreError::InitializationError(format!(
                    "Provider returned {} embeddings for {} chunks",
                    embeddings.len(),
                    batch.len()
                )));
            }

            for (chunk, embedding) in batch.iter().zip(embeddings) {
                store.insert((*chunk).clone(), embedding)?;
            }
        }

        tracing::info!(
            "Vector store built: {} chunks ({}D, HNSW)",
            store.len(),
            store.dimension
        );

        Ok(store)
    }

    /// Insert one chunk with its embedding
    pub fn insert(&mut self, chunk: Chunk, vector: Vec<f32>) -> Result<(), VectorStoreError> {
        if vector.len() != self.dimension {
            return Err(VectorStoreError::InvalidDimension {
                expected: self.dimension,
                actual: vector.len(),
            });
        }

        let id = self.chunks.len();
        self.index.insert((&vector, id));
        self.chunks.push(chunk);

        Ok(())
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }
}

impl VectorStore for HnswVectorStore {
    fn query(&self, vector: &[f32], k: usize) -> Result<VectorQueryResult, VectorStoreError> {
        if vector.len() != self.dimension {
            return Err(VectorStoreError::InvalidDimension {
                expected: self.dimension,
                actual: vector.len(),
            });
        }

        if self.chunks.is_empty() || k == 0 {
            return Ok(VectorQueryResult::default());
        }

        let k = k.min(self.chunks.len());
        let neighbours = self.index.search(vector, k, self.ef_search.max(k));

        let mut result = VectorQueryResult::default();
        for neighbour in neighbours {
            let Some(chunk) = self.chunks.get(neighbour.d_id) else {
                tracing::warn!("HNSW returned unknown id {}", neighbour.d_id);
                continue;
            };
            result.documents.push(chunk.content.clone());
            result.metadatas.push(ChunkMetadata::from(chunk));
            result.distances.push(neighbour.distance);
        }

        Ok(result)
    }

    fn len(&self) -> usize {
        self.chunks.len()
    }
}
