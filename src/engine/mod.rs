//! Query orchestration
//!
//! `START → SEARCH → (EMPTY-SHORT-CIRCUIT | GENERATE) → DONE`
//!
//! Search runs dense and sparse retrieval, fuses and optionally reranks. An
//! empty result skips generation entirely. Generation failures degrade to a
//! textual error answer while keeping the retrieved sources.

use crate::config::{Config, RetrievalConfig};
use crate::corpus::{load_chunks, Chunk};
use crate::embedding::{
    EmbeddingProvider, FastEmbedProvider, HnswVectorStore, LexicalIndex, VectorStore,
};
use crate::error::{Result, WikiRagError};
use crate::generation::{build_prompt, Generator, OllamaGenerator};
use crate::retrieval::{
    Candidate, CrossEncoder, DenseRetriever, FastEmbedCrossEncoder, HybridSearcher, Reranker,
    SearchOutcome, SparseRetriever,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Answer returned when retrieval finds nothing
pub const NO_INFORMATION_ANSWER: &str =
    "Sorry, I couldn't find relevant information in the wiki.";

/// A retrieved passage as reported to the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub title: String,
    pub source: String,
    pub category: String,
    pub relevance: f32,
    pub method: String,
}

impl From<&Candidate> for Source {
    fn from(candidate: &Candidate) -> Self {
        Self {
            title: candidate.title.clone(),
            source: candidate.source.clone(),
            category: candidate.category.clone(),
            relevance: candidate.relevance,
            method: candidate.method_label(),
        }
    }
}

/// Wall-clock timing per phase, in milliseconds
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct QueryTiming {
    pub search_ms: f64,
    pub generation_ms: f64,
    pub total_ms: f64,
}

/// Result of a full query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub answer: String,
    pub sources: Vec<Source>,
    /// Whether retrieval found grounding context
    pub success: bool,
    /// Set when the generator failed and `answer` is an error message
    pub generation_failed: bool,
    pub timing: QueryTiming,
}

/// Per-query options
#[derive(Debug, Clone, Copy)]
pub struct QueryOptions {
    pub top_k: usize,
    pub use_reranking: bool,
    /// Deadline checked before each stage starts
    pub stage_timeout: Option<Duration>,
}

impl From<&RetrievalConfig> for QueryOptions {
    fn from(config: &RetrievalConfig) -> Self {
        Self {
            top_k: config.top_k,
            use_reranking: config.use_reranking,
            stage_timeout: config.stage_timeout_ms.map(Duration::from_millis),
        }
    }
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self::from(&RetrievalConfig::default())
    }
}

fn elapsed_ms(since: Instant) -> f64 {
    since.elapsed().as_secs_f64() * 1000.0
}

fn check_deadline(deadline: Option<Instant>, stage: &'static str) -> Result<()> {
    match deadline {
        Some(deadline) if Instant::now() >= deadline => {
            tracing::warn!("Query deadline elapsed before {}", stage);
            Err(WikiRagError::Timeout { stage })
        }
        _ => Ok(()),
    }
}

/// Sequences retrieval and generation for each query
///
/// Cheap to share: every collaborator is immutable and reference-counted.
pub struct QueryEngine {
    searcher: Arc<HybridSearcher>,
    generator: Arc<dyn Generator>,
    defaults: QueryOptions,
}

impl QueryEngine {
    pub fn new(
        searcher: Arc<HybridSearcher>,
        generator: Arc<dyn Generator>,
        defaults: QueryOptions,
    ) -> Self {
        Self {
            searcher,
            generator,
            defaults,
        }
    }

    /// Build every component from configuration
    ///
    /// Any failure (missing corpus, model download, bad settings) aborts
    /// construction.
    pub fn from_config(config: &Config) -> Result<Self> {
        let searcher = build_searcher(config)?;
        let generator = Arc::new(OllamaGenerator::new(&config.llm)?);

        Ok(Self::new(
            Arc::new(searcher),
            generator,
            QueryOptions::from(&config.retrieval),
        ))
    }

    pub fn searcher(&self) -> &Arc<HybridSearcher> {
        &self.searcher
    }

    pub fn defaults(&self) -> QueryOptions {
        self.defaults
    }

    /// Query with the configured defaults
    pub async fn ask(&self, text: &str) -> Result<QueryResponse> {
        self.query(text, self.defaults).await
    }

    /// Run the full pipeline for `text`
    pub async fn query(&self, text: &str, options: QueryOptions) -> Result<QueryResponse> {
        if text.trim().is_empty() {
            return Err(WikiRagError::InvalidQuery(
                "Query text cannot be empty".to_string(),
            ));
        }
        if options.top_k == 0 {
            return Err(WikiRagError::InvalidQuery(
                "top_k must be greater than 0".to_string(),
            ));
        }

        tracing::info!(query = %text, top_k = options.top_k, "Processing query");

        let start = Instant::now();
        let deadline = options.stage_timeout.map(|timeout| start + timeout);

        // SEARCH
        let outcome = self.search(text, options, deadline).await?;
        let search_ms = elapsed_ms(start);

        // EMPTY-SHORT-CIRCUIT
        if outcome.candidates.is_empty() {
            tracing::info!("No relevant context found; skipping generation");
            return Ok(QueryResponse {
                answer: NO_INFORMATION_ANSWER.to_string(),
                sources: Vec::new(),
                success: false,
                generation_failed: false,
                timing: QueryTiming {
                    search_ms,
                    generation_ms: 0.0,
                    total_ms: elapsed_ms(start),
                },
            });
        }

        // GENERATE
        check_deadline(deadline, "generate")?;
        let context = outcome.candidates;
        let generation_start = Instant::now();
        let prompt = build_prompt(text, &context);
        let (answer, generation_failed) = match self.generator.complete(&prompt).await {
            Ok(answer) => (answer, false),
            Err(e) => {
                tracing::warn!("Answer generation failed: {}", e);
                (format!("Error generating answer: {}", e), true)
            }
        };
        let generation_ms = elapsed_ms(generation_start);

        let response = QueryResponse {
            answer,
            sources: context.iter().map(Source::from).collect(),
            success: true,
            generation_failed,
            timing: QueryTiming {
                search_ms,
                generation_ms,
                total_ms: elapsed_ms(start),
            },
        };

        tracing::info!(
            sources = response.sources.len(),
            search_ms = response.timing.search_ms,
            generation_ms = response.timing.generation_ms,
            "Query complete"
        );

        Ok(response)
    }

    /// Retrieval only, honoring stage deadlines
    pub async fn search(
        &self,
        text: &str,
        options: QueryOptions,
        deadline: Option<Instant>,
    ) -> Result<SearchOutcome> {
        check_deadline(deadline, "search")?;
        let shortlist = self
            .searcher
            .fused_shortlist(text, options.top_k, options.use_reranking)
            .await?;

        if shortlist.rerank_planned && !shortlist.candidates.is_empty() {
            check_deadline(deadline, "rerank")?;
        }

        Ok(self.searcher.finalize(text, shortlist, options.top_k))
    }
}

/// Load the corpus and build both indexes plus the optional reranker
pub fn build_searcher(config: &Config) -> Result<HybridSearcher> {
    let chunks: Arc<[Chunk]> = load_chunks(&config.corpus.chunks_file)?.into();

    let provider: Arc<dyn EmbeddingProvider> = Arc::new(FastEmbedProvider::new(
        &config.embedding.model,
        config.embedding.batch_size,
    )?);

    let store: Arc<dyn VectorStore> = Arc::new(HnswVectorStore::build(
        &chunks,
        provider.as_ref(),
        &config.indexing,
        config.embedding.batch_size,
    )?);

    let texts: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
    let lexical = Arc::new(LexicalIndex::build(&texts, &config.lexical)?);

    let reranker = if config.retrieval.use_reranking {
        let encoder: Arc<dyn CrossEncoder> =
            Arc::new(FastEmbedCrossEncoder::new(&config.reranker.model)?);
        Some(Reranker::new(encoder, config.reranker.max_chars))
    } else {
        None
    };

    let dense = DenseRetriever::new(provider, store);
    let sparse = SparseRetriever::new(lexical, chunks)?;

    Ok(HybridSearcher::new(
        dense,
        sparse,
        reranker,
        &config.retrieval,
    )?)
}
