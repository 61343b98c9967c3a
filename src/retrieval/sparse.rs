//! Sparse retrieval: full scan of the TF-IDF matrix

use crate::corpus::Chunk;
use crate::embedding::LexicalIndex;
use crate::retrieval::{Candidate, Method, SearchError};
use std::sync::Arc;

/// Scores the query against every corpus chunk by TF-IDF cosine similarity
pub struct SparseRetriever {
    index: Arc<LexicalIndex>,
    chunks: Arc<[Chunk]>,
}

impl SparseRetriever {
    /// `index` must have been built over `chunks` in the same order
    pub fn new(index: Arc<LexicalIndex>, chunks: Arc<[Chunk]>) -> Result<Self, SearchError> {
        if index.len() != chunks.len() {
            return Err(SearchError::KeywordSearchError(format!(
                "Lexical index covers {} documents but corpus has {}",
                index.len(),
                chunks.len()
            )));
        }
        Ok(Self { index, chunks })
    }

    /// Up to `k` candidates with positive similarity, highest first
    ///
    /// Ties keep corpus order.
    pub fn search(&self, query: &str, k: usize) -> Result<Vec<Candidate>, SearchError> {
        if k == 0 || self.chunks.is_empty() {
            return Ok(Vec::new());
        }

        let similarities = self.index.similarities(query);

        let mut ranked: Vec<(usize, f32)> = similarities
            .into_iter()
            .enumerate()
            .filter(|(_, score)| *score > 0.0)
            .collect();

        // Stable sort keeps corpus order among equal scores
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(k);

        let candidates: Vec<Candidate> = ranked
            .into_iter()
            .filter_map(|(idx, score)| {
                self.chunks
                    .get(idx)
                    .map(|chunk| Candidate::from_chunk(chunk, score, Method::Sparse))
            })
            .collect();

        tracing::debug!("Sparse search returned {} candidates", candidates.len());

        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LexicalConfig;

    fn retriever(chunks: Vec<Chunk>) -> SparseRetriever {
        let config = LexicalConfig {
            max_features: 1000,
            ngram_max: 2,
            stop_words: "english".to_string(),
            extra_stop_words: Vec::new(),
        };
        let texts: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        let index = LexicalIndex::build(&texts, &config).unwrap();
        SparseRetriever::new(Arc::new(index), chunks.into()).unwrap()
    }

    #[test]
    fn test_excludes_zero_scores() {
        let retriever = retriever(vec![
            Chunk::new("postgres database schema", "db.md", "Database"),
            Chunk::new("frontend build with vite", "web.md", "Frontend"),
        ]);

        let results = retriever.search("database", 10).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].source, "db.md");
        assert_eq!(results[0].method, Method::Sparse);
        assert!(results[0].relevance > 0.0);
    }

    #[test]
    fn test_ties_keep_corpus_order() {
        let retriever = retriever(vec![
            Chunk::new("deploy guide", "b.md", "B"),
            Chunk::new("unrelated text", "x.md", "X"),
            Chunk::new("deploy guide", "a.md", "A"),
        ]);

        let results = retriever.search("deploy guide", 10).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].source, "b.md");
        assert_eq!(results[1].source, "a.md");
        assert_eq!(results[0].relevance, results[1].relevance);
    }

    #[test]
    fn test_limits_to_k() {
        let retriever = retriever(vec![
            Chunk::new("cache redis", "1.md", "1"),
            Chunk::new("cache memcached", "2.md", "2"),
            Chunk::new("cache cdn", "3.md", "3"),
        ]);

        assert_eq!(retriever.search("cache", 2).unwrap().len(), 2);
    }

    #[test]
    fn test_mismatched_index_rejected() {
        let config = LexicalConfig {
            max_features: 10,
            ngram_max: 1,
            stop_words: "none".to_string(),
            extra_stop_words: Vec::new(),
        };
        let index = LexicalIndex::build(&["one", "two"], &config).unwrap();
        let chunks: Arc<[Chunk]> = vec![Chunk::new("one", "1.md", "1")].into();
        assert!(SparseRetriever::new(Arc::new(index), chunks).is_err());
    }
}
