//! Cross-encoder reranking

use crate::retrieval::Candidate;
use fastembed::{RerankInitOptions, RerankerModel, TextRerank};
use std::sync::Arc;
use thiserror::Error;

/// Default number of content characters paired with the query
pub const DEFAULT_MAX_CHARS: usize = 512;

#[derive(Error, Debug)]
pub enum RerankError {
    #[error("Reranker initialization failed: {0}")]
    InitializationError(String),

    #[error("Reranking failed: {0}")]
    RerankingError(String),

    #[error("Cross-encoder returned {actual} scores for {expected} pairs")]
    ScoreCountMismatch { expected: usize, actual: usize },
}

/// Scores `(query, document)` pairs jointly
///
/// Scores are raw model outputs (logits); one per document, in input order.
pub trait CrossEncoder: Send + Sync {
    fn score_batch(&self, query: &str, documents: &[&str]) -> Result<Vec<f32>, RerankError>;

    fn model_name(&self) -> &str;
}

/// FastEmbed cross-encoder running locally
pub struct FastEmbedCrossEncoder {
    model: Arc<TextRerank>,
    model_name: String,
}

impl FastEmbedCrossEncoder {
    /// Create a new cross-encoder with specified model
    ///
    /// # Arguments
    /// * `model_name` - One of `bge-reranker-base`, `bge-reranker-v2-m3`,
    ///   `jina-reranker-v1-turbo-en`
    pub fn new(model_name: &str) -> Result<Self, RerankError> {
        let reranker_model = match model_name {
            "bge-reranker-base" => RerankerModel::BGERerankerBase,
            "bge-reranker-v2-m3" => RerankerModel::BGERerankerV2M3,
            "jina-reranker-v1-turbo-en" => RerankerModel::JINARerankerV1TurboEn,
            _ => {
                return Err(RerankError::InitializationError(format!(
                    "Unsupported reranker model: {}",
                    model_name
                )));
            }
        };

        tracing::info!("Initializing reranker model: {}", model_name);

        let init_options =
            RerankInitOptions::new(reranker_model).with_show_download_progress(true);

        let model = TextRerank::try_new(init_options)
            .map_err(|e| RerankError::InitializationError(e.to_string()))?;

        Ok(Self {
            model: Arc::new(model),
            model_name: model_name.to_string(),
        })
    }

    /// Create cross-encoder with default model
    pub fn with_default_model() -> Result<Self, RerankError> {
        Self::new("bge-reranker-base")
    }
}

impl CrossEncoder for FastEmbedCrossEncoder {
    fn score_batch(&self, query: &str, documents: &[&str]) -> Result<Vec<f32>, RerankError> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        let results = self
            .model
            .rerank(query, documents.to_vec(), false, None)
            .map_err(|e| RerankError::RerankingError(e.to_string()))?;

        // FastEmbed returns results sorted by score; restore input order
        let mut scores = vec![None; documents.len()];
        for result in &results {
            if let Some(slot) = scores.get_mut(result.index) {
                *slot = Some(result.score);
            }
        }

        let scores: Option<Vec<f32>> = scores.into_iter().collect();
        scores.ok_or(RerankError::ScoreCountMismatch {
            expected: documents.len(),
            actual: results.len(),
        })
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

/// Logistic function, saturating to exactly `0.0`/`1.0` for extreme inputs
pub fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Truncate to at most `max_chars` characters on a char boundary
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Re-scores a fused shortlist with a cross-encoder
pub struct Reranker {
    encoder: Arc<dyn CrossEncoder>,
    max_chars: usize,
}

impl Reranker {
    pub fn new(encoder: Arc<dyn CrossEncoder>, max_chars: usize) -> Self {
        Self {
            encoder,
            max_chars: max_chars.max(1),
        }
    }

    pub fn model_name(&self) -> &str {
        self.encoder.model_name()
    }

    /// Rerank `candidates` against `query`, keeping the best `top_k`
    ///
    /// Each returned candidate has `relevance` set to its sigmoid-normalized
    /// cross-encoder score and is marked as reranked. An empty input returns
    /// immediately without calling the cross-encoder.
    pub fn rerank(
        &self,
        query: &str,
        candidates: Vec<Candidate>,
        top_k: usize,
    ) -> Result<Vec<Candidate>, RerankError> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        tracing::debug!("Reranking {} candidates", candidates.len());

        let documents: Vec<&str> = candidates
            .iter()
            .map(|c| truncate_chars(&c.content, self.max_chars))
            .collect();

        let raw_scores = self.encoder.score_batch(query, &documents)?;

        if raw_scores.len() != candidates.len() {
            return Err(RerankError::ScoreCountMismatch {
                expected: candidates.len(),
                actual: raw_scores.len(),
            });
        }

        let mut reranked: Vec<Candidate> = candidates
            .into_iter()
            .zip(raw_scores)
            .map(|(mut candidate, raw)| {
                let normalized = if raw.is_nan() {
                    tracing::warn!("Cross-encoder returned NaN for '{}'", candidate.title);
                    0.0
                } else {
                    sigmoid(f64::from(raw)) as f32
                };
                candidate.relevance = normalized;
                candidate.reranked = true;
                candidate
            })
            .collect();

        reranked.sort_by(|a, b| b.relevance.total_cmp(&a.relevance));
        reranked.truncate(top_k);

        tracing::debug!("Reranked to top {} candidates", reranked.len());

        Ok(reranked)
    }
}
