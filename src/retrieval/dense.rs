//! Dense retrieval over the vector store

use crate::embedding::{EmbeddingProvider, VectorStore};
use crate::retrieval::{Candidate, Method, SearchError};
use std::sync::Arc;

/// Convert a cosine distance in `[0, 2]` to a similarity in `[0, 1]`
pub fn distance_to_similarity(distance: f32) -> f32 {
    1.0 - distance / 2.0
}

/// Embeds the query and returns its nearest chunks by cosine distance
pub struct DenseRetriever {
    provider: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
}

impl DenseRetriever {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, store: Arc<dyn VectorStore>) -> Self {
        Self { provider, store }
    }

    /// Up to `k` candidates ordered by descending similarity
    ///
    /// An empty store yields an empty list. A response whose columns differ
    /// in length is treated as no results.
    pub fn search(&self, query: &str, k: usize) -> Result<Vec<Candidate>, SearchError> {
        if k == 0 || self.store.is_empty() {
            return Ok(Vec::new());
        }

        let embedding = self
            .provider
            .embed(query)
            .map_err(|e| SearchError::EmbeddingError(e.to_string()))?;

        let response = self
            .store
            .query(&embedding, k)
            .map_err(|e| SearchError::VectorSearchError(e.to_string()))?;

        if !response.is_consistent() {
            tracing::warn!(
                documents = response.documents.len(),
                metadatas = response.metadatas.len(),
                distances = response.distances.len(),
                "Vector store returned mismatched columns; ignoring dense results"
            );
            return Ok(Vec::new());
        }

        let mut candidates: Vec<Candidate> = response
            .documents
            .into_iter()
            .zip(response.metadatas)
            .zip(response.distances)
            .filter(|(_, distance)| distance.is_finite())
            .map(|((content, metadata), distance)| {
                Candidate::new(
                    content,
                    metadata.source,
                    metadata.title,
                    metadata.category,
                    distance_to_similarity(distance),
                    Method::Dense,
                )
            })
            .collect();

        // Stores are expected to return nearest first; enforce it
        candidates.sort_by(|a, b| b.relevance.total_cmp(&a.relevance));
        candidates.truncate(k);

        tracing::debug!("Dense search returned {} candidates", candidates.len());

        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::{
        ChunkMetadata, EmbeddingError, VectorQueryResult, VectorStoreError,
    };

    struct ConstantEmbedder;

    impl EmbeddingProvider for ConstantEmbedder {
        fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
            Ok(vec![1.0, 0.0])
        }

        fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }

        fn dimension(&self) -> usize {
            2
        }

        fn model_name(&self) -> &str {
            "constant"
        }
    }

    struct FixedStore(VectorQueryResult);

    impl VectorStore for FixedStore {
        fn query(&self, _vector: &[f32], _k: usize) -> Result<VectorQueryResult, VectorStoreError> {
            Ok(self.0.clone())
        }

        fn len(&self) -> usize {
            self.0.documents.len().max(1)
        }
    }

    fn meta(source: &str) -> ChunkMetadata {
        ChunkMetadata {
            source: source.to_string(),
            title: "T".to_string(),
            category: "General".to_string(),
        }
    }

    #[test]
    fn test_distance_conversion() {
        assert_eq!(distance_to_similarity(0.0), 1.0);
        assert_eq!(distance_to_similarity(1.0), 0.5);
        assert_eq!(distance_to_similarity(2.0), 0.0);
    }

    #[test]
    fn test_search_orders_by_similarity() {
        let store = FixedStore(VectorQueryResult {
            documents: vec!["far".to_string(), "near".to_string()],
            metadatas: vec![meta("far.md"), meta("near.md")],
            distances: vec![1.2, 0.2],
        });
        let retriever = DenseRetriever::new(Arc::new(ConstantEmbedder), Arc::new(store));

        let results = retriever.search("query", 5).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].source, "near.md");
        assert!((results[0].relevance - 0.9).abs() < 1e-6);
        assert!((results[1].relevance - 0.4).abs() < 1e-6);
        assert!(results.iter().all(|c| c.method == Method::Dense));
    }

    #[test]
    fn test_mismatched_columns_yield_nothing() {
        let store = FixedStore(VectorQueryResult {
            documents: vec!["a".to_string(), "b".to_string()],
            metadatas: vec![meta("a.md")],
            distances: vec![0.1, 0.2],
        });
        let retriever = DenseRetriever::new(Arc::new(ConstantEmbedder), Arc::new(store));

        assert!(retriever.search("query", 5).unwrap().is_empty());
    }
}
