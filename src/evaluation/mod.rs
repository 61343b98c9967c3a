//! Retrieval accuracy over labelled queries

use crate::error::{Result, WikiRagError};
use crate::retrieval::HybridSearcher;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A query and the source document expected to rank first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalCase {
    pub query: String,
    pub expected_source: String,
    #[serde(default)]
    pub category: Option<String>,
}

/// Outcome of one case
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalOutcome {
    pub query: String,
    pub expected_source: String,
    pub top_source: Option<String>,
    pub top_relevance: Option<f32>,
    pub correct: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalReport {
    pub correct: usize,
    pub total: usize,
    /// Percentage of cases whose top hit came from the expected source
    pub accuracy: f64,
    pub outcomes: Vec<EvalOutcome>,
}

pub fn load_cases(path: &Path) -> Result<Vec<EvalCase>> {
    let content = std::fs::read_to_string(path).map_err(|e| WikiRagError::Io {
        source: e,
        context: format!("Failed to read evaluation cases: {:?}", path),
    })?;

    serde_json::from_str(&content).map_err(|e| WikiRagError::Json {
        source: e,
        context: format!("Failed to parse evaluation cases: {:?}", path),
    })
}

/// Run every case through `searcher` and score top-1 source accuracy
pub async fn evaluate(
    searcher: &HybridSearcher,
    cases: &[EvalCase],
    k: usize,
    use_reranking: bool,
) -> Result<EvalReport> {
    let mut outcomes = Vec::with_capacity(cases.len());

    for case in cases {
        let outcome = searcher.search(&case.query, k, use_reranking).await?;
        let top = outcome.candidates.first();
        let top_source = top.map(|c| c.source.clone());
        let correct = top_source.as_deref() == Some(case.expected_source.as_str());

        tracing::debug!(
            query = %case.query,
            expected = %case.expected_source,
            got = ?top_source,
            correct,
            "Evaluated case"
        );

        outcomes.push(EvalOutcome {
            query: case.query.clone(),
            expected_source: case.expected_source.clone(),
            top_source,
            top_relevance: top.map(|c| c.relevance),
            correct,
        });
    }

    let correct = outcomes.iter().filter(|o| o.correct).count();
    let total = outcomes.len();
    let accuracy = if total == 0 {
        0.0
    } else {
        correct as f64 / total as f64 * 100.0
    };

    Ok(EvalReport {
        correct,
        total,
        accuracy,
        outcomes,
    })
}
