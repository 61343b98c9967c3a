//! Hybrid search combining dense and sparse retrieval

use crate::config::RetrievalConfig;
use crate::retrieval::{
    fuse, shortlist_size, Candidate, DenseRetriever, FusionWeights, Reranker, SparseRetriever,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Embedding generation failed: {0}")]
    EmbeddingError(String),

    #[error("Vector search failed: {0}")]
    VectorSearchError(String),

    #[error("Keyword search failed: {0}")]
    KeywordSearchError(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),
}

/// Fused shortlist plus per-retriever hit counts
#[derive(Debug, Clone)]
pub struct FusedShortlist {
    pub candidates: Vec<Candidate>,
    pub dense_hits: usize,
    pub sparse_hits: usize,
    /// Whether the shortlist was sized for a reranking pass
    pub rerank_planned: bool,
}

/// Final ranked candidates with the shortlist size they were cut from
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub candidates: Vec<Candidate>,
    pub shortlist_len: usize,
    pub dense_hits: usize,
    pub sparse_hits: usize,
    pub reranked: bool,
}

/// Hybrid searcher: dense ∥ sparse → weighted fusion → optional rerank
pub struct HybridSearcher {
    dense: DenseRetriever,
    sparse: SparseRetriever,
    reranker: Option<Reranker>,
    weights: FusionWeights,
    rerank_multiplier: usize,
    plain_multiplier: usize,
}

impl HybridSearcher {
    pub fn new(
        dense: DenseRetriever,
        sparse: SparseRetriever,
        reranker: Option<Reranker>,
        config: &RetrievalConfig,
    ) -> Result<Self, SearchError> {
        let weights = FusionWeights::new(config.dense_weight, config.sparse_weight)
            .map_err(|e| SearchError::InvalidQuery(e.to_string()))?;

        Ok(Self {
            dense,
            sparse,
            reranker,
            weights,
            rerank_multiplier: config.rerank_multiplier.max(1),
            plain_multiplier: config.plain_multiplier.max(1),
        })
    }

    pub fn has_reranker(&self) -> bool {
        self.reranker.is_some()
    }

    /// Full search: fuse, then rerank when requested and available
    pub async fn search(
        &self,
        query: &str,
        k: usize,
        use_reranking: bool,
    ) -> Result<SearchOutcome, SearchError> {
        let shortlist = self.fused_shortlist(query, k, use_reranking).await?;
        Ok(self.finalize(query, shortlist, k))
    }

    /// Stage one: run both retrievers and fuse their hits
    ///
    /// A retriever failure is logged and counted as zero hits.
    pub async fn fused_shortlist(
        &self,
        query: &str,
        k: usize,
        use_reranking: bool,
    ) -> Result<FusedShortlist, SearchError> {
        if query.trim().is_empty() {
            return Err(SearchError::InvalidQuery(
                "Query text cannot be empty".to_string(),
            ));
        }
        if k == 0 {
            return Err(SearchError::InvalidQuery(
                "k must be greater than 0".to_string(),
            ));
        }

        let rerank_planned = use_reranking && self.reranker.is_some();
        if use_reranking && !rerank_planned {
            tracing::debug!("Reranking requested but no reranker is configured");
        }

        let search_k = shortlist_size(
            k,
            rerank_planned,
            self.rerank_multiplier,
            self.plain_multiplier,
        );

        let (dense_results, sparse_results) = tokio::join!(
            self.dense_search(query, search_k),
            self.sparse_search(query, search_k)
        );

        let dense_hits = dense_results.len();
        let sparse_hits = sparse_results.len();

        let candidates = fuse(dense_results, sparse_results, search_k, self.weights);

        tracing::debug!(
            dense_hits,
            sparse_hits,
            fused = candidates.len(),
            search_k,
            "Fused shortlist ready"
        );

        Ok(FusedShortlist {
            candidates,
            dense_hits,
            sparse_hits,
            rerank_planned,
        })
    }

    /// Stage two: narrow the shortlist to `k`
    ///
    /// Reranked candidates carry the normalized cross-encoder score as
    /// relevance; otherwise relevance is the fused score. A reranker failure
    /// falls back to fused order.
    pub fn finalize(&self, query: &str, shortlist: FusedShortlist, k: usize) -> SearchOutcome {
        let FusedShortlist {
            candidates,
            dense_hits,
            sparse_hits,
            rerank_planned,
        } = shortlist;
        let shortlist_len = candidates.len();

        if rerank_planned && !candidates.is_empty() {
            if let Some(reranker) = &self.reranker {
                match reranker.rerank(query, candidates.clone(), k) {
                    Ok(reranked) => {
                        return SearchOutcome {
                            candidates: reranked,
                            shortlist_len,
                            dense_hits,
                            sparse_hits,
                            reranked: true,
                        };
                    }
                    Err(e) => {
                        tracing::warn!("Reranking failed, keeping fused order: {}", e);
                    }
                }
            }
        }

        let mut finals = candidates;
        finals.truncate(k);
        for candidate in &mut finals {
            candidate.relevance = candidate.hybrid_score;
        }

        SearchOutcome {
            candidates: finals,
            shortlist_len,
            dense_hits,
            sparse_hits,
            reranked: false,
        }
    }

    async fn dense_search(&self, query: &str, limit: usize) -> Vec<Candidate> {
        self.dense.search(query, limit).unwrap_or_else(|e| {
            tracing::warn!("Dense search failed, continuing without it: {}", e);
            Vec::new()
        })
    }

    async fn sparse_search(&self, query: &str, limit: usize) -> Vec<Candidate> {
        self.sparse.search(query, limit).unwrap_or_else(|e| {
            tracing::warn!("Sparse search failed, continuing without it: {}", e);
            Vec::new()
        })
    }
}
