//! Answer generation provider abstraction and implementations.
//!
//! Defines the [`Generator`] trait and concrete implementations:
//! - **[`DisabledGenerator`]** — returns errors; used when generation is not
//!   configured.
//! - **[`RemoteGenerator`]** — calls an OpenAI-compatible chat completions
//!   endpoint (Gemini's compatibility surface or OpenAI itself) with retry
//!   and backoff.
//!
//! The retry policy matches the embedding client: 429 and 5xx retry with
//! exponential backoff, other 4xx fail immediately.

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::config::GenerationConfig;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Trait for answer generation providers.
///
/// Takes a fully assembled prompt and returns the model's reply text.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Returns the model identifier (e.g. `"gemini-2.0-flash"`).
    fn model_name(&self) -> &str;

    /// Generate a reply for the given prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Instantiate the generator selected by configuration.
pub fn create_generator(config: &GenerationConfig) -> Result<Arc<dyn Generator>> {
    match config.provider.as_str() {
        "disabled" => Ok(Arc::new(DisabledGenerator)),
        "gemini" | "openai" => Ok(Arc::new(RemoteGenerator::new(config)?)),
        other => bail!("Unknown generation provider: {}", other),
    }
}

// ============ Disabled Provider ============

/// A no-op generation provider that always returns errors.
///
/// Used when `generation.provider = "disabled"` in the configuration.
pub struct DisabledGenerator;

#[async_trait]
impl Generator for DisabledGenerator {
    fn model_name(&self) -> &str {
        "disabled"
    }

    async fn generate(&self, _prompt: &str) -> Result<String> {
        bail!("Generation provider is disabled")
    }
}

// ============ Remote Provider ============

/// Generation provider backed by an OpenAI-compatible
/// `POST /chat/completions` endpoint.
///
/// `provider = "gemini"` uses Gemini's compatibility surface and reads the
/// key from `GEMINI_API_KEY` (falling back to `GOOGLE_API_KEY`);
/// `provider = "openai"` uses the OpenAI API and `OPENAI_API_KEY`.
/// `generation.url` overrides the base URL in either case.
pub struct RemoteGenerator {
    model: String,
    base_url: String,
    api_key: String,
    max_retries: u32,
    timeout_secs: u64,
}

impl RemoteGenerator {
    /// Create a remote generator from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if `model` is not set or the provider's API key is
    /// not in the environment.
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let model = config
            .model
            .clone()
            .ok_or_else(|| anyhow::anyhow!("generation.model required"))?;

        let (default_base, api_key) = resolve_endpoint(&config.provider)?;
        let base_url = config
            .url
            .clone()
            .unwrap_or_else(|| default_base.to_string());

        Ok(Self {
            model,
            base_url,
            api_key,
            max_retries: config.max_retries,
            timeout_secs: config.timeout_secs,
        })
    }
}

#[async_trait]
impl Generator for RemoteGenerator {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()?;

        let url = format!("{}/chat/completions", self.base_url);
        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "user", "content": prompt }
            ],
        });

        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tokio::time::sleep(delay).await;
            }

            let resp = client
                .post(&url)
                .header("Authorization", format!("Bearer {}", self.api_key))
                .header("Content-Type", "application/json")
                .json(&body)
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let json: serde_json::Value = response.json().await?;
                        return parse_chat_response(&json);
                    }

                    if status.as_u16() == 429 || status.is_server_error() {
                        let body_text = response.text().await.unwrap_or_default();
                        last_err = Some(anyhow::anyhow!(
                            "Chat API error {}: {}",
                            status,
                            body_text
                        ));
                        continue;
                    }

                    let body_text = response.text().await.unwrap_or_default();
                    bail!("Chat API error {}: {}", status, body_text);
                }
                Err(e) => {
                    last_err = Some(e.into());
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("Generation failed after retries")))
    }
}

/// Resolve the default base URL and API key for a provider name.
fn resolve_endpoint(provider: &str) -> Result<(&'static str, String)> {
    match provider {
        "gemini" => {
            let key = std::env::var("GEMINI_API_KEY")
                .or_else(|_| std::env::var("GOOGLE_API_KEY"))
                .map_err(|_| anyhow::anyhow!("GEMINI_API_KEY environment variable not set"))?;
            Ok((GEMINI_BASE_URL, key))
        }
        "openai" => {
            let key = std::env::var("OPENAI_API_KEY")
                .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY environment variable not set"))?;
            Ok((OPENAI_BASE_URL, key))
        }
        other => bail!("Unknown generation provider: {}", other),
    }
}

/// Parse an OpenAI-compatible chat completions response.
///
/// Extracts `choices[0].message.content` and trims surrounding whitespace.
fn parse_chat_response(json: &serde_json::Value) -> Result<String> {
    let content = json
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid chat response: missing message content"))?;

    Ok(content.trim().to_string())
}
