//! Thin client for the Google generative-language REST API. The provider
//! enforces no response schema, so callers own all validation of the
//! returned text (see [`crate::ai::parse`]).

use crate::config::AiConfig;
use axum::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Seam between the app and the text generator; swapped for a stub in tests.
#[async_trait]
pub trait GenerativeClient: Send + Sync {
    /// Send one prompt and return the model's raw text.
    async fn generate(&self, prompt: &str) -> anyhow::Result<String>;
}

#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
    request_timeout: Duration,
}

impl GeminiClient {
    pub fn new(cfg: &AiConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: cfg.base_url.clone(),
            model: cfg.model.clone(),
            api_key: cfg.api_key.clone(),
            request_timeout: Duration::from_secs(cfg.request_timeout_secs),
        }
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

#[async_trait]
impl GenerativeClient for GeminiClient {
    async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        let response = self
            .http
            .post(&url)
            .timeout(self.request_timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("generative request failed: {}", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("generative backend returned HTTP {}: {}", status, body);
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| anyhow::anyhow!("generative response decode failed: {}", e))?;

        let text: String = parsed
            .candidates
            .into_iter()
            .flat_map(|c| c.content.parts)
            .map(|p| p.text)
            .collect();

        if text.is_empty() {
            anyhow::bail!("generative backend returned no candidates");
        }

        tracing::debug!(response_len = text.len(), "generative response received");
        Ok(text)
    }
}
