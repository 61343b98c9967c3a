//! Answer generation from retrieved context
//!
//! The generator only ever sees the ranked context by shared reference; it
//! cannot reorder or modify it.

use crate::config::LlmConfig;
use crate::retrieval::Candidate;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Answer the model is told to give when the context is insufficient
pub const NOT_IN_WIKI: &str = "This information is not available in the wiki";

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Generator initialization failed: {0}")]
    InitializationError(String),

    #[error("Request to language model failed: {0}")]
    RequestFailed(String),

    #[error("Language model returned {status}: {body}")]
    BadStatus { status: u16, body: String },

    #[error("Malformed language model response: {0}")]
    MalformedResponse(String),
}

/// Text completion backend
#[async_trait]
pub trait Generator: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, GenerationError>;

    fn model_name(&self) -> &str;
}

/// Build the grounded prompt for `query` over `context`
pub fn build_prompt(query: &str, context: &[Candidate]) -> String {
    let context_text = context
        .iter()
        .map(|doc| format!("[{}]\n{}", doc.title, doc.content))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "You are a helpful wiki assistant. Answer based on the provided documentation.\n\n\
         WIKI DOCUMENTATION:\n{context_text}\n\n\
         USER QUESTION: {query}\n\n\
         Instructions:\n\
         - Answer concisely and accurately based ONLY on the documentation above\n\
         - If the answer is not in the documentation, say \"{NOT_IN_WIKI}\"\n\
         - Provide specific details from the documentation\n\
         - Keep your answer clear and to the point"
    )
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatOptions {
    temperature: f32,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    options: ChatOptions,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ChatResponseMessage,
}

/// Ollama chat endpoint (`POST {base_url}/api/chat`, non-streaming)
pub struct OllamaGenerator {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    temperature: f32,
}

impl OllamaGenerator {
    pub fn new(config: &LlmConfig) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GenerationError::InitializationError(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: format!("{}/api/chat", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl Generator for OllamaGenerator {
    async fn complete(&self, prompt: &str) -> Result<String, GenerationError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            stream: false,
            options: ChatOptions {
                temperature: self.temperature,
            },
        };

        tracing::info!("Generating answer with {}", self.model);

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| GenerationError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::BadStatus { status, body });
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;

        Ok(chat.message.content)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::Method;

    #[test]
    fn test_prompt_contains_context_and_instructions() {
        let context = vec![
            Candidate::new("Run cargo build", "setup.md", "Setup", "setup", 0.9, Method::Hybrid),
            Candidate::new("We use PostgreSQL", "arch.md", "Database", "arch", 0.8, Method::Dense),
        ];

        let prompt = build_prompt("What database do we use?", &context);

        assert!(prompt.contains("[Setup]\nRun cargo build\n\n[Database]\nWe use PostgreSQL"));
        assert!(prompt.contains("USER QUESTION: What database do we use?"));
        assert!(prompt.contains("ONLY on the documentation above"));
        assert!(prompt.contains(NOT_IN_WIKI));
    }

    #[test]
    fn test_ollama_endpoint() {
        let config = LlmConfig {
            provider: "ollama".to_string(),
            base_url: "http://localhost:11434/".to_string(),
            model: "llama2".to_string(),
            temperature: 0.7,
            timeout_secs: 5,
        };
        let generator = OllamaGenerator::new(&config).unwrap();
        assert_eq!(generator.endpoint, "http://localhost:11434/api/chat");
        assert_eq!(generator.model_name(), "llama2");
    }
}
