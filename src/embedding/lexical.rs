/// TF-IDF lexical index over the full corpus
///
/// Text is analyzed with a tantivy analyzer (split on non-alphanumerics,
/// lowercase, stop-word removal), then expanded to n-grams. The vocabulary is
/// capped to the most frequent terms across the corpus. Document vectors use
/// raw term counts weighted by smoothed IDF and are L2-normalized, so the
/// cosine similarity of two vectors is their dot product.
use crate::config::LexicalConfig;
use ahash::{HashMap, HashMapExt};
use tantivy::tokenizer::{
    Language, LowerCaser, RemoveLongFilter, SimpleTokenizer, StopWordFilter, TextAnalyzer, Token,
    TokenStream,
};
use thiserror::Error;

/// Tokens longer than this are dropped before n-gram expansion
const MAX_TOKEN_LEN: usize = 40;

#[derive(Error, Debug)]
pub enum LexicalIndexError {
    #[error("Index initialization failed: {0}")]
    InitializationError(String),

    #[error("Unsupported stop-word set: {0}")]
    UnsupportedStopWords(String),
}

/// Sparse vector as `(term_id, weight)` pairs sorted by `term_id`
pub type SparseVector = Vec<(u32, f32)>;

/// Immutable TF-IDF index
pub struct LexicalIndex {
    analyzer: TextAnalyzer,
    ngram_max: usize,
    vocabulary: HashMap<String, u32>,
    idf: Vec<f32>,
    documents: Vec<SparseVector>,
}

impl LexicalIndex {
    /// Build the index over `texts`; document ids follow input order
    pub fn build<S: AsRef<str>>(
        texts: &[S],
        config: &LexicalConfig,
    ) -> Result<Self, LexicalIndexError> {
        if config.max_features == 0 {
            return Err(LexicalIndexError::InitializationError(
                "max_features must be greater than 0".to_string(),
            ));
        }
        if config.ngram_max == 0 {
            return Err(LexicalIndexError::InitializationError(
                "ngram_max must be greater than 0".to_string(),
            ));
        }

        let mut analyzer = build_analyzer(config)?;

        // Per-document term counts, plus corpus-wide frequency and document frequency
        let mut doc_counts: Vec<HashMap<String, u32>> = Vec::with_capacity(texts.len());
        let mut corpus_freq: HashMap<String, u64> = HashMap::new();
        let mut doc_freq: HashMap<String, u32> = HashMap::new();

        for text in texts {
            let counts = term_counts(&mut analyzer, text.as_ref(), config.ngram_max);
            for (term, count) in &counts {
                *corpus_freq.entry(term.clone()).or_insert(0) += u64::from(*count);
                *doc_freq.entry(term.clone()).or_insert(0) += 1;
            }
            doc_counts.push(counts);
        }

        // Keep the most frequent terms; ties resolved alphabetically
        let mut ranked: Vec<(String, u64)> = corpus_freq.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(config.max_features);

        // Term ids in alphabetical order
        let mut terms: Vec<String> = ranked.into_iter().map(|(term, _)| term).collect();
        terms.sort();

        let n_docs = texts.len() as f32;
        let mut vocabulary = HashMap::with_capacity(terms.len());
        let mut idf = Vec::with_capacity(terms.len());
        for (id, term) in terms.into_iter().enumerate() {
            let df = doc_freq.get(&term).copied().unwrap_or(0) as f32;
            idf.push(((1.0 + n_docs) / (1.0 + df)).ln() + 1.0);
            vocabulary.insert(term, id as u32);
        }

        let mut index = Self {
            analyzer,
            ngram_max: config.ngram_max,
            vocabulary,
            idf,
            documents: Vec::with_capacity(doc_counts.len()),
        };

        index.documents = doc_counts
            .iter()
            .map(|counts| index.weigh(counts))
            .collect();

        tracing::info!(
            "Lexical index built: {} documents, {} terms",
            index.documents.len(),
            index.vocabulary.len()
        );

        Ok(index)
    }

    /// TF-IDF vector of arbitrary text under the corpus vocabulary
    ///
    /// Terms outside the vocabulary are ignored; text with no known terms
    /// yields an empty vector.
    pub fn vectorize(&self, text: &str) -> SparseVector {
        // TextAnalyzer needs `&mut self`; clone to keep the index shareable
        let mut analyzer = self.analyzer.clone();
        let counts = term_counts(&mut analyzer, text, self.ngram_max);
        self.weigh(&counts)
    }

    /// Cosine similarity of `query` against every document, in corpus order
    pub fn similarities(&self, query: &str) -> Vec<f32> {
        let query_vector = self.vectorize(query);
        if query_vector.is_empty() {
            return vec![0.0; self.documents.len()];
        }

        self.documents
            .iter()
            .map(|doc| sparse_dot(&query_vector, doc))
            .collect()
    }

    /// Number of indexed documents
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Size of the capped vocabulary
    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn contains_term(&self, term: &str) -> bool {
        self.vocabulary.contains_key(term)
    }

    fn weigh(&self, counts: &HashMap<String, u32>) -> SparseVector {
        let mut vector: SparseVector = counts
            .iter()
            .filter_map(|(term, count)| {
                self.vocabulary
                    .get(term)
                    .map(|&id| (id, *count as f32 * self.idf[id as usize]))
            })
            .collect();

        let norm = vector.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
        if norm > 0.0 {
            for (_, weight) in vector.iter_mut() {
                *weight /= norm;
            }
        }

        vector.sort_unstable_by_key(|(id, _)| *id);
        vector
    }
}

fn build_analyzer(config: &LexicalConfig) -> Result<TextAnalyzer, LexicalIndexError> {
    let builtin = match config.stop_words.as_str() {
        "english" => StopWordFilter::new(Language::English).ok_or_else(|| {
            LexicalIndexError::UnsupportedStopWords("english".to_string())
        })?,
        "none" => StopWordFilter::remove(Vec::<String>::new()),
        other => return Err(LexicalIndexError::UnsupportedStopWords(other.to_string())),
    };

    let extra = StopWordFilter::remove(
        config
            .extra_stop_words
            .iter()
            .map(|w| w.to_lowercase())
            .collect::<Vec<_>>(),
    );

    Ok(TextAnalyzer::builder(SimpleTokenizer::default())
        .filter(RemoveLongFilter::limit(MAX_TOKEN_LEN))
        .filter(LowerCaser)
        .filter(builtin)
        .filter(extra)
        .build())
}

/// Count unigrams through `ngram_max`-grams of analyzed tokens
fn term_counts(analyzer: &mut TextAnalyzer, text: &str, ngram_max: usize) -> HashMap<String, u32> {
    let mut tokens: Vec<String> = Vec::new();
    let mut stream = analyzer.token_stream(text);
    stream.process(&mut |token: &Token| {
        // Single-character tokens carry no lexical signal
        if token.text.chars().count() >= 2 {
            tokens.push(token.text.clone());
        }
    });

    let mut counts = HashMap::new();
    for n in 1..=ngram_max {
        for window in tokens.windows(n) {
            *counts.entry(window.join(" ")).or_insert(0) += 1;
        }
    }
    counts
}

fn sparse_dot(a: &[(u32, f32)], b: &[(u32, f32)]) -> f32 {
    let (mut i, mut j) = (0, 0);
    let mut dot = 0.0;
    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                dot += a[i].1 * b[j].1;
                i += 1;
                j += 1;
            }
        }
    }
    dot
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> LexicalConfig {
        LexicalConfig {
            max_features: 1000,
            ngram_max: 2,
            stop_words: "english".to_string(),
            extra_stop_words: Vec::new(),
        }
    }

    #[test]
    fn test_stop_words_and_case_folding() {
        let index = LexicalIndex::build(&["The Database is PostgreSQL"], &config()).unwrap();

        assert!(index.contains_term("database"));
        assert!(index.contains_term("postgresql"));
        assert!(index.contains_term("database postgresql"));
        assert!(!index.contains_term("the"));
        assert!(!index.contains_term("Database"));
    }

    #[test]
    fn test_vocabulary_cap_keeps_most_frequent() {
        let mut cfg = config();
        cfg.max_features = 2;
        cfg.ngram_max = 1;

        let index = LexicalIndex::build(
            &["rust rust rust", "cargo cargo", "clippy"],
            &cfg,
        )
        .unwrap();

        assert_eq!(index.vocabulary_size(), 2);
        assert!(index.contains_term("rust"));
        assert!(index.contains_term("cargo"));
        assert!(!index.contains_term("clippy"));
    }

    #[test]
    fn test_document_vectors_are_normalized() {
        let index = LexicalIndex::build(&["setup docker compose locally"], &config()).unwrap();
        let sims = index.similarities("setup docker compose locally");
        assert!((sims[0] - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_no_overlap_scores_zero() {
        let index = LexicalIndex::build(&["kubernetes deployment", "redis cache"], &config())
            .unwrap();
        let sims = index.similarities("postgres migrations");
        assert_eq!(sims, vec![0.0, 0.0]);
        assert!(index.vectorize("the a an").is_empty());
    }

    #[test]
    fn test_similarity_ranks_matching_document_higher() {
        let index = LexicalIndex::build(
            &[
                "configure the redis cache eviction policy",
                "database migrations run with sqlx",
                "redis cluster failover",
            ],
            &config(),
        )
        .unwrap();

        let sims = index.similarities("redis cache");
        assert!(sims[0] > sims[2]);
        assert!(sims[2] > 0.0);
        assert_eq!(sims[1], 0.0);
    }

    #[test]
    fn test_empty_corpus() {
        let index = LexicalIndex::build::<&str>(&[], &config()).unwrap();
        assert!(index.is_empty());
        assert!(index.similarities("anything").is_empty());
    }

    #[test]
    fn test_extra_stop_words() {
        let mut cfg = config();
        cfg.extra_stop_words = vec!["Wiki".to_string()];
        let index = LexicalIndex::build(&["wiki setup guide"], &cfg).unwrap();
        assert!(!index.contains_term("wiki"));
        assert!(index.contains_term("setup guide"));
    }

    #[test]
    fn test_unknown_stop_words_rejected() {
        let mut cfg = config();
        cfg.stop_words = "french-ish".to_string();
        assert!(matches!(
            LexicalIndex::build(&["x"], &cfg),
            Err(LexicalIndexError::UnsupportedStopWords(_))
        ));
    }
}
