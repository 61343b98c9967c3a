//! Shared fixtures: a small wiki corpus and in-memory model stand-ins
#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use wikirag::config::{Config, RetrievalConfig};
use wikirag::corpus::Chunk;
use wikirag::embedding::{
    ChunkMetadata, EmbeddingError, EmbeddingProvider, LexicalIndex, VectorQueryResult,
    VectorStore, VectorStoreError,
};
use wikirag::generation::{GenerationError, Generator};
use wikirag::retrieval::{
    CrossEncoder, DenseRetriever, HybridSearcher, RerankError, Reranker, SparseRetriever,
};

pub fn chunk(content: &str, source: &str, title: &str, category: &str) -> Chunk {
    Chunk {
        content: content.to_string(),
        source: source.to_string(),
        title: title.to_string(),
        category: category.to_string(),
    }
}

/// Six chunks over five documents; the last shares `(source, title)` with the first
pub fn wiki_corpus() -> Vec<Chunk> {
    vec![
        chunk(
            "To reset your password open the account settings page and choose reset password.",
            "accounts.md",
            "Reset password",
            "Accounts",
        ),
        chunk(
            "Install the VPN client and connect to the corporate gateway using your credentials.",
            "network.md",
            "VPN setup",
            "Network",
        ),
        chunk(
            "Printers on every floor accept jobs from the central printer queue server.",
            "office.md",
            "Printers",
            "Office",
        ),
        chunk(
            "Password length must be at least twelve characters and rotate every ninety days.",
            "security.md",
            "Password policy",
            "Security",
        ),
        chunk(
            "Submit expense reports through the finance portal before the monthly deadline.",
            "finance.md",
            "Expense reports",
            "Finance",
        ),
        chunk(
            "Password reset emails expire after one hour.",
            "accounts.md",
            "Reset password",
            "Accounts",
        ),
    ]
}

const KEYWORDS: [&str; 5] = ["password", "vpn", "printer", "expense", "policy"];

/// Bag-of-keywords embedder: one dimension per keyword plus a small bias
pub struct KeywordEmbedder;

impl EmbeddingProvider for KeywordEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let lower = text.to_lowercase();
        let mut vector: Vec<f32> = KEYWORDS
            .iter()
            .map(|kw| lower.matches(kw).count() as f32)
            .collect();
        vector.push(0.1);
        Ok(vector)
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    fn dimension(&self) -> usize {
        KEYWORDS.len() + 1
    }

    fn model_name(&self) -> &str {
        "keyword-test"
    }
}

/// Exact nearest-neighbour store using cosine distance
pub struct BruteForceStore {
    chunks: Vec<Chunk>,
    vectors: Vec<Vec<f32>>,
}

impl BruteForceStore {
    pub fn build(chunks: &[Chunk], provider: &dyn EmbeddingProvider) -> Self {
        let vectors = chunks
            .iter()
            .map(|c| provider.embed(&c.content).unwrap())
            .collect();
        Self {
            chunks: chunks.to_vec(),
            vectors,
        }
    }
}

fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    1.0 - dot / (na * nb)
}

impl VectorStore for BruteForceStore {
    fn query(&self, vector: &[f32], k: usize) -> Result<VectorQueryResult, VectorStoreError> {
        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(i, v)| (i, cosine_distance(vector, v)))
            .collect();
        scored.sort_by(|a, b| a.1.total_cmp(&b.1));
        scored.truncate(k);

        let mut result = VectorQueryResult::default();
        for (i, distance) in scored {
            let chunk = &self.chunks[i];
            result.documents.push(chunk.content.clone());
            result.metadatas.push(ChunkMetadata::from(chunk));
            result.distances.push(distance);
        }
        Ok(result)
    }

    fn len(&self) -> usize {
        self.chunks.len()
    }
}

/// Store that returns a fixed list of `(chunk, distance)` hits regardless of the query
pub struct ScriptedStore {
    pub hits: Vec<(Chunk, f32)>,
}

impl VectorStore for ScriptedStore {
    fn query(&self, _vector: &[f32], k: usize) -> Result<VectorQueryResult, VectorStoreError> {
        let mut result = VectorQueryResult::default();
        for (chunk, distance) in self.hits.iter().take(k) {
            result.documents.push(chunk.content.clone());
            result.metadatas.push(ChunkMetadata::from(chunk));
            result.distances.push(*distance);
        }
        Ok(result)
    }

    fn len(&self) -> usize {
        self.hits.len()
    }
}

/// Cross-encoder scoring by how many query words appear in the document
pub struct OverlapEncoder {
    pub calls: AtomicUsize,
}

impl OverlapEncoder {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

impl CrossEncoder for OverlapEncoder {
    fn score_batch(&self, query: &str, documents: &[&str]) -> Result<Vec<f32>, RerankError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let words: Vec<String> = query
            .split_whitespace()
            .map(|w| w.to_lowercase())
            .filter(|w| w.len() > 2)
            .collect();

        Ok(documents
            .iter()
            .map(|doc| {
                let lower = doc.to_lowercase();
                let hits = words.iter().filter(|w| lower.contains(w.as_str())).count();
                hits as f32 * 2.0 - 3.0
            })
            .collect())
    }

    fn model_name(&self) -> &str {
        "overlap-test"
    }
}

pub struct FailingEncoder;

impl CrossEncoder for FailingEncoder {
    fn score_batch(&self, _query: &str, _documents: &[&str]) -> Result<Vec<f32>, RerankError> {
        Err(RerankError::RerankingError("model unavailable".to_string()))
    }

    fn model_name(&self) -> &str {
        "failing-test"
    }
}

/// Generator that counts calls and either echoes the prompt size or fails
pub struct RecordingGenerator {
    pub calls: AtomicUsize,
    pub fail: bool,
}

impl RecordingGenerator {
    pub fn answering() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: true,
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Generator for RecordingGenerator {
    async fn complete(&self, prompt: &str) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(GenerationError::RequestFailed("connection refused".to_string()));
        }
        Ok(format!("Answer grounded in {} prompt bytes", prompt.len()))
    }

    fn model_name(&self) -> &str {
        "recording-test"
    }
}

pub fn sparse_retriever(chunks: &[Chunk]) -> SparseRetriever {
    let texts: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
    let index = LexicalIndex::build(&texts, &Config::default().lexical).unwrap();
    SparseRetriever::new(Arc::new(index), chunks.to_vec().into()).unwrap()
}

/// Searcher over `chunks` with keyword embeddings and brute-force dense search
pub fn keyword_searcher(
    chunks: &[Chunk],
    encoder: Option<Arc<dyn CrossEncoder>>,
    config: &RetrievalConfig,
) -> HybridSearcher {
    let provider: Arc<dyn EmbeddingProvider> = Arc::new(KeywordEmbedder);
    let store: Arc<dyn VectorStore> = Arc::new(BruteForceStore::build(chunks, provider.as_ref()));
    searcher_with_store(chunks, store, encoder, config)
}

pub fn searcher_with_store(
    chunks: &[Chunk],
    store: Arc<dyn VectorStore>,
    encoder: Option<Arc<dyn CrossEncoder>>,
    config: &RetrievalConfig,
) -> HybridSearcher {
    let provider: Arc<dyn EmbeddingProvider> = Arc::new(KeywordEmbedder);
    let dense = DenseRetriever::new(provider, store);
    let sparse = sparse_retriever(chunks);
    let reranker = encoder.map(|e| Reranker::new(e, 512));
    HybridSearcher::new(dense, sparse, reranker, config).unwrap()
}
