//! Weighted score fusion with `(source, title)` deduplication

use crate::retrieval::{Candidate, FusionKey, Method};
use ahash::{HashMap, HashMapExt};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum FusionError {
    #[error("Invalid weight configuration: weights must be finite and non-negative")]
    InvalidWeights,
}

/// Weights applied to each retriever's relevance
///
/// They need not sum to one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionWeights {
    pub dense: f32,
    pub sparse: f32,
}

impl FusionWeights {
    pub fn new(dense: f32, sparse: f32) -> Result<Self, FusionError> {
        let valid = |w: f32| w.is_finite() && w >= 0.0;
        if !valid(dense) || !valid(sparse) {
            return Err(FusionError::InvalidWeights);
        }
        Ok(Self { dense, sparse })
    }
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            dense: 0.7,
            sparse: 0.3,
        }
    }
}

/// Shortlist size before the final cut: wider when a reranker will narrow it
pub fn shortlist_size(
    k: usize,
    use_reranking: bool,
    rerank_multiplier: usize,
    plain_multiplier: usize,
) -> usize {
    if use_reranking {
        k.saturating_mul(rerank_multiplier)
    } else {
        k.saturating_mul(plain_multiplier)
    }
}

/// Merge dense and sparse hits into one ranked list
///
/// Dense hits enter with `relevance * dense` as `Method::Dense`. A sparse hit
/// whose key already exists adds `relevance * sparse` to that entry and turns
/// it into `Method::Hybrid`; otherwise it enters with `relevance * sparse` as
/// `Method::SparseOnly`. Single-method hits are not rescaled to compete with
/// dually-found ones. The result is sorted by `hybrid_score` descending (ties
/// keep first-insertion order), truncated to `limit`, and holds at most one
/// entry per `(source, title)`.
pub fn fuse(
    dense_results: Vec<Candidate>,
    sparse_results: Vec<Candidate>,
    limit: usize,
    weights: FusionWeights,
) -> Vec<Candidate> {
    let mut positions: HashMap<FusionKey, usize> =
        HashMap::with_capacity(dense_results.len() + sparse_results.len());
    let mut fused: Vec<Candidate> = Vec::with_capacity(dense_results.len() + sparse_results.len());

    for mut candidate in dense_results {
        let key = candidate.fusion_key();
        candidate.hybrid_score = candidate.relevance * weights.dense;
        candidate.method = Method::Dense;

        match positions.get(&key) {
            // Repeated key within the dense list: last write wins, position kept
            Some(&pos) => fused[pos] = candidate,
            None => {
                positions.insert(key, fused.len());
                fused.push(candidate);
            }
        }
    }

    for mut candidate in sparse_results {
        let key = candidate.fusion_key();
        let contribution = candidate.relevance * weights.sparse;

        match positions.get(&key) {
            Some(&pos) => {
                let existing = &mut fused[pos];
                existing.hybrid_score += contribution;
                existing.method = Method::Hybrid;
            }
            None => {
                candidate.hybrid_score = contribution;
                candidate.method = Method::SparseOnly;
                positions.insert(key, fused.len());
                fused.push(candidate);
            }
        }
    }

    fused.sort_by(|a, b| b.hybrid_score.total_cmp(&a.hybrid_score));
    fused.truncate(limit);
    fused
}
