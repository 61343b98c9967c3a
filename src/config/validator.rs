use crate::config::Config;
use crate::error::{Result, ValidationError, WikiRagError};

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration, collecting every violation
    pub fn validate(config: &Config) -> Result<()> {
        let mut errors = Vec::new();

        Self::validate_schema_version(config, &mut errors);
        Self::validate_corpus(config, &mut errors);
        Self::validate_embedding(config, &mut errors);
        Self::validate_indexing(config, &mut errors);
        Self::validate_lexical(config, &mut errors);
        Self::validate_retrieval(config, &mut errors);
        Self::validate_reranker(config, &mut errors);
        Self::validate_llm(config, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(WikiRagError::ConfigValidation { errors })
        }
    }

    fn validate_schema_version(config: &Config, errors: &mut Vec<ValidationError>) {
        let version = &config.meta.schema_version;
        if version != "1.0.0" {
            errors.push(ValidationError::new(
                "_meta.schema_version",
                format!("Unsupported schema version: {}", version),
            ));
        }
    }

    fn validate_corpus(config: &Config, errors: &mut Vec<ValidationError>) {
        // Existence is checked when the engine loads the corpus
        if config.corpus.chunks_file.as_os_str().is_empty() {
            errors.push(ValidationError::new(
                "corpus.chunks_file",
                "Chunks file path cannot be empty",
            ));
        }
    }

    fn validate_embedding(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.embedding.batch_size == 0 {
            errors.push(ValidationError::new(
                "embedding.batch_size",
                "Batch size must be greater than 0",
            ));
        }

        if config.embedding.model.is_empty() {
            errors.push(ValidationError::new(
                "embedding.model",
                "Model name cannot be empty",
            ));
        }
    }

    fn validate_indexing(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.indexing.vector_dim == 0 {
            errors.push(ValidationError::new(
                "indexing.vector_dim",
                "Vector dimension must be greater than 0",
            ));
        }

        if config.indexing.hnsw_ef_construction == 0 {
            errors.push(ValidationError::new(
                "indexing.hnsw_ef_construction",
                "HNSW ef_construction must be greater than 0",
            ));
        }

        if config.indexing.hnsw_ef_search == 0 {
            errors.push(ValidationError::new(
                "indexing.hnsw_ef_search",
                "HNSW ef_search must be greater than 0",
            ));
        }

        if config.indexing.hnsw_m == 0 {
            errors.push(ValidationError::new(
                "indexing.hnsw_m",
                "HNSW M must be greater than 0",
            ));
        }
    }

    fn validate_lexical(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.lexical.max_features == 0 {
            errors.push(ValidationError::new(
                "lexical.max_features",
                "Vocabulary size must be greater than 0",
            ));
        }

        if !(1..=3).contains(&config.lexical.ngram_max) {
            errors.push(ValidationError::new(
                "lexical.ngram_max",
                format!(
                    "N-gram size must be between 1 and 3, got {}",
                    config.lexical.ngram_max
                ),
            ));
        }

        let stop_words = config.lexical.stop_words.as_str();
        if stop_words != "english" && stop_words != "none" {
            errors.push(ValidationError::new(
                "lexical.stop_words",
                format!("Stop words must be 'english' or 'none', got '{}'", stop_words),
            ));
        }
    }

    fn validate_retrieval(config: &Config, errors: &mut Vec<ValidationError>) {
        let retrieval = &config.retrieval;

        if retrieval.top_k == 0 {
            errors.push(ValidationError::new(
                "retrieval.top_k",
                "top_k must be greater than 0",
            ));
        }

        for (path, weight) in [
            ("retrieval.dense_weight", retrieval.dense_weight),
            ("retrieval.sparse_weight", retrieval.sparse_weight),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                errors.push(ValidationError::new(
                    path,
                    format!("Weight must be a finite non-negative number, got {}", weight),
                ));
            }
        }

        if retrieval.dense_weight == 0.0 && retrieval.sparse_weight == 0.0 {
            errors.push(ValidationError::new(
                "retrieval.dense_weight",
                "Dense and sparse weights cannot both be zero",
            ));
        }

        if retrieval.rerank_multiplier == 0 {
            errors.push(ValidationError::new(
                "retrieval.rerank_multiplier",
                "Shortlist multiplier must be greater than 0",
            ));
        }

        if retrieval.plain_multiplier == 0 {
            errors.push(ValidationError::new(
                "retrieval.plain_multiplier",
                "Shortlist multiplier must be greater than 0",
            ));
        }

        if retrieval.stage_timeout_ms == Some(0) {
            errors.push(ValidationError::new(
                "retrieval.stage_timeout_ms",
                "Stage timeout must be greater than 0 when set",
            ));
        }
    }

    fn validate_reranker(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.reranker.max_chars == 0 {
            errors.push(ValidationError::new(
                "reranker.max_chars",
                "Truncation length must be greater than 0",
            ));
        }

        if config.retrieval.use_reranking && config.reranker.model.is_empty() {
            errors.push(ValidationError::new(
                "reranker.model",
                "Model name cannot be empty when reranking is enabled",
            ));
        }
    }

    fn validate_llm(config: &Config, errors: &mut Vec<ValidationError>) {
        let temp = config.llm.temperature;
        if !(0.0..=2.0).contains(&temp) {
            errors.push(ValidationError::new(
                "llm.temperature",
                format!("Temperature must be between 0.0 and 2.0, got {}", temp),
            ));
        }

        let provider = &config.llm.provider;
        let valid_providers = ["ollama"];
        if !valid_providers.contains(&provider.as_str()) {
            errors.push(ValidationError::new(
                "llm.provider",
                format!(
                    "Provider must be one of {:?}, got '{}'",
                    valid_providers, provider
                ),
            ));
        }

        if config.llm.timeout_secs == 0 {
            errors.push(ValidationError::new(
                "llm.timeout_secs",
                "Timeout must be greater than 0",
            ));
        }
    }
}
