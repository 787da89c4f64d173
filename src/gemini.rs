//! Gemini API client
//!
//! Backs both capabilities the pipeline needs from a hosted model:
//! text generation (`generateContent`) and embeddings (`embedContent`).
//! Uses a long-lived reqwest::Client for connection pooling.

use crate::error::OrchestrationError;
use crate::llm::{render_prompt, PromptVariables, TextGenerator};
use crate::retrieval::Embedder;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const EMBEDDING_MODEL: &str = "text-embedding-004";

/// Output dimension of `text-embedding-004`.
pub const GEMINI_EMBEDDING_DIM: usize = 768;

/// Reusable Gemini client (connection-pooled)
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: String, model: impl Into<String>) -> crate::Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(Self {
            client,
            api_key,
            model: model.into(),
        })
    }

    fn ensure_key(&self) -> crate::Result<()> {
        if self.api_key.is_empty() {
            return Err(OrchestrationError::LlmError(
                "GEMINI_API_KEY not configured".to_string(),
            ));
        }
        Ok(())
    }

    /// Generate a response from Gemini.
    pub async fn generate(&self, prompt: &str) -> crate::Result<String> {
        self.ensure_key()?;

        let url = format!("{}/{}:generateContent?key={}", API_BASE, self.model, self.api_key);

        let request = GeminiRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.3,
                top_p: 0.9,
                top_k: 40,
                max_output_tokens: 1024,
            },
        };

        debug!(model = %self.model, "Calling Gemini generateContent");

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Gemini API request failed: {}", e);
                OrchestrationError::LlmError(format!("Gemini API error: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!(%status, "Gemini API error response: {}", error_text);
            return Err(OrchestrationError::LlmError(format!(
                "Gemini API returned {}: {}",
                status, error_text
            )));
        }

        let gemini_response: GeminiResponse = response.json().await.map_err(|e| {
            error!("Failed to parse Gemini response: {}", e);
            OrchestrationError::LlmError(format!("Gemini parse error: {}", e))
        })?;

        let answer = first_text(gemini_response)?;

        info!(length = answer.len(), "Gemini response received");

        Ok(answer)
    }

    /// Embed a single text with `text-embedding-004`.
    pub async fn embed_text(&self, text: &str) -> crate::Result<Vec<f32>> {
        self.ensure_key()
            .map_err(|e| OrchestrationError::EmbeddingError(e.to_string()))?;

        let url = format!("{}/{}:embedContent?key={}", API_BASE, EMBEDDING_MODEL, self.api_key);

        let request = EmbedRequest {
            model: format!("models/{}", EMBEDDING_MODEL),
            content: Content {
                parts: vec![Part {
                    text: text.to_string(),
                }],
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| OrchestrationError::EmbeddingError(format!("Gemini embed request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(OrchestrationError::EmbeddingError(format!(
                "Gemini embed returned {}: {}",
                status, error_text
            )));
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|e| OrchestrationError::EmbeddingError(format!("Gemini embed parse error: {}", e)))?;

        Ok(parsed.embedding.values)
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn complete(&self, prompt_template: &str, variables: &PromptVariables) -> crate::Result<String> {
        let prompt = render_prompt(prompt_template, variables);
        self.generate(&prompt).await
    }
}

#[async_trait]
impl Embedder for GeminiClient {
    fn dimension(&self) -> usize {
        GEMINI_EMBEDDING_DIM
    }

    async fn embed(&self, text: &str) -> crate::Result<Vec<f32>> {
        self.embed_text(text).await
    }
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: i32,
    max_output_tokens: i32,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

#[derive(Debug, Serialize)]
struct EmbedRequest {
    model: String,
    content: Content,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: EmbeddingValues,
}

#[derive(Debug, Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

/// Text of the first part of the first candidate.
fn first_text(response: GeminiResponse) -> crate::Result<String> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| OrchestrationError::LlmError("No response from Gemini API".to_string()))?;

    candidate
        .content
        .parts
        .into_iter()
        .next()
        .map(|part| part.text)
        .ok_or_else(|| OrchestrationError::LlmError("Empty response from Gemini".to_string()))
}
