//! Generation backend abstraction and implementations.
//!
//! Defines the [`GenerationBackend`] trait and two concrete backends:
//!
//! - **[`GeminiBackend`]** — Google's hosted Generative Language API.
//! - **[`OllamaBackend`]** — a locally running Ollama instance.
//!
//! Callers depend only on the `generate(prompt) -> text` capability, never
//! on which variant they got. Each backend owns its own `reqwest` client
//! (connection pool and timeout) and its own retry policy, and surfaces
//! every failure as a uniform [`GenerationError`]; transport-specific
//! errors never leak upward.
//!
//! Responses are not cached: identical prompts are recomputed. Prompts
//! embed retrieved context and a free-form question, so they are rarely
//! identical in practice; the recompute cost is accepted rather than
//! overlooked.
//!
//! # Retry Strategy
//!
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors → retry
//! - Exponential backoff: 1s, 2s, 4s, ... capped at 2^5
//! - At most `max_retries` retries (default 2), so a systemic outage is
//!   surfaced quickly instead of masked.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::config::{GeminiConfig, LlamaConfig};
use crate::error::GenerationError;
use crate::router::AnswerSource;

#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Registry key and model-tag name (e.g. `"gemini"`, `"llama"`).
    fn name(&self) -> &str;

    /// The provenance tag stamped on answers this backend produced.
    fn source(&self) -> AnswerSource;

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

// ============ Backend registry ============

/// Maps model tags to backend instances, all constructed at startup.
///
/// The router looks backends up by name only; adding a third backend means
/// registering it here and nothing else.
#[derive(Default)]
pub struct BackendRegistry {
    backends: Vec<Arc<dyn GenerationBackend>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, backend: Arc<dyn GenerationBackend>) {
        self.backends.push(backend);
    }

    pub fn find(&self, name: &str) -> Option<Arc<dyn GenerationBackend>> {
        self.backends
            .iter()
            .find(|b| b.name() == name)
            .cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

// ============ Gemini (cloud) ============

/// Cloud backend calling `models/{model}:generateContent` on the Google
/// Generative Language API.
///
/// The API key is read from the configured environment variable at
/// construction time; a missing key fails startup rather than the first
/// request.
#[derive(Debug)]
pub struct GeminiBackend {
    model: String,
    api_key: String,
    client: reqwest::Client,
    max_retries: u32,
}

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

impl GeminiBackend {
    pub fn new(config: &GeminiConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).with_context(|| {
            format!(
                "{} environment variable not set (required for the gemini backend)",
                config.api_key_env
            )
        })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            model: config.model.clone(),
            api_key,
            client,
            max_retries: config.max_retries,
        })
    }

    fn error(&self, message: impl Into<String>) -> GenerationError {
        GenerationError::new(self.name(), message)
    }
}

#[async_trait]
impl GenerationBackend for GeminiBackend {
    fn name(&self) -> &str {
        "gemini"
    }

    fn source(&self) -> AnswerSource {
        AnswerSource::CloudGeneration
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let url = format!("{}/{}:generateContent", GEMINI_BASE_URL, self.model);
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
        });

        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tokio::time::sleep(delay).await;
            }

            let resp = self
                .client
                .post(&url)
                .header("x-goog-api-key", &self.api_key)
                .json(&body)
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let json: serde_json::Value = response
                            .json()
                            .await
                            .map_err(|e| self.error(format!("invalid response body: {}", e)))?;
                        return parse_gemini_response(&json).map_err(|m| self.error(m));
                    }

                    let body_text = response.text().await.unwrap_or_default();
                    if status.as_u16() == 429 || status.is_server_error() {
                        last_err = Some(format!("HTTP {}: {}", status, body_text));
                        continue;
                    }

                    return Err(self.error(format!("HTTP {}: {}", status, body_text)));
                }
                Err(e) => {
                    last_err = Some(e.to_string());
                    continue;
                }
            }
        }

        Err(self.error(
            last_err.unwrap_or_else(|| "generation failed after retries".to_string()),
        ))
    }
}

/// Extract `candidates[0].content.parts[0].text` from a generateContent
/// response.
fn parse_gemini_response(json: &serde_json::Value) -> Result<String, String> {
    json.get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.get(0))
        .and_then(|p| p.get("text"))
        .and_then(|t| t.as_str())
        .map(|t| t.to_string())
        .ok_or_else(|| "response contained no candidate text".to_string())
}

// ============ Ollama (local) ============

/// Local backend calling `POST /api/generate` on an Ollama instance.
pub struct OllamaBackend {
    url: String,
    model: String,
    client: reqwest::Client,
    max_retries: u32,
}

impl OllamaBackend {
    pub fn new(config: &LlamaConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            url: config.url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            client,
            max_retries: config.max_retries,
        })
    }

    fn error(&self, message: impl Into<String>) -> GenerationError {
        GenerationError::new(self.name(), message)
    }
}

#[async_trait]
impl GenerationBackend for OllamaBackend {
    fn name(&self) -> &str {
        "llama"
    }

    fn source(&self) -> AnswerSource {
        AnswerSource::LocalGeneration
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let url = format!("{}/api/generate", self.url);
        let body = serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
        });

        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tokio::time::sleep(delay).await;
            }

            let resp = self.client.post(&url).json(&body).send().await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let json: serde_json::Value = response
                            .json()
                            .await
                            .map_err(|e| self.error(format!("invalid response body: {}", e)))?;
                        return parse_ollama_response(&json).map_err(|m| self.error(m));
                    }

                    let body_text = response.text().await.unwrap_or_default();
                    if status.as_u16() == 429 || status.is_server_error() {
                        last_err = Some(format!("HTTP {}: {}", status, body_text));
                        continue;
                    }

                    return Err(self.error(format!("HTTP {}: {}", status, body_text)));
                }
                Err(e) => {
                    last_err = Some(format!(
                        "connection error (is Ollama running at {}?): {}",
                        self.url, e
                    ));
                    continue;
                }
            }
        }

        Err(self.error(
            last_err.unwrap_or_else(|| "generation failed after retries".to_string()),
        ))
    }
}

/// Extract the `response` field from an Ollama non-streaming reply.
fn parse_ollama_response(json: &serde_json::Value) -> Result<String, String> {
    json.get("response")
        .and_then(|r| r.as_str())
        .map(|r| r.to_string())
        .ok_or_else(|| "response contained no generated text".to_string())
}
