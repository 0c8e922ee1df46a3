//! AI safety-tip client for the gasmon dashboard.
//!
//! The dashboard asks an [`InsightProvider`] for one short tip derived from
//! the current gas level. [`fetch_tip`] never fails: every error maps to a
//! static fallback so the UI always has text to show.

#![forbid(unsafe_code)]

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Used when the provider answers with nothing.
pub const EMPTY_FALLBACK: &str = "Ensure ventilation is optimal.";

/// Used when the request fails for any reason.
pub const ERROR_FALLBACK: &str = "Check your gas connections regularly.";

pub fn prompt_for(level: u8) -> String {
    format!("Status: Gas Level {level}%. Provide one short safety tip.")
}

// ─── Errors ───────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum InsightError {
    #[error("no API key configured")]
    MissingApiKey,

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Malformed(String),
}

// ─── Provider trait ───────────────────────────────────────────────────────────

#[async_trait]
pub trait InsightProvider: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &str;
    async fn generate(&self, prompt: &str) -> Result<String, InsightError>;
}

/// Ask `provider` for a tip for `level`, mapping every failure to a fallback.
pub async fn fetch_tip(provider: &dyn InsightProvider, level: u8) -> String {
    let prompt = prompt_for(level);
    match provider.generate(&prompt).await {
        Ok(text) => {
            let text = text.trim();
            if text.is_empty() {
                debug!(provider = provider.name(), "empty insight, using fallback");
                EMPTY_FALLBACK.to_string()
            } else {
                text.to_string()
            }
        }
        Err(e) => {
            warn!(provider = provider.name(), error = %e, "insight fetch failed");
            ERROR_FALLBACK.to_string()
        }
    }
}

// ─── Config ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Gemini,
    /// Canned tip, no network.
    Offline,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightConfig {
    #[serde(default)]
    pub provider: ProviderKind,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Falls back to `GEMINI_API_KEY`, then `API_KEY`, when unset or empty.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_model() -> String {
    "gemini-3-flash-preview".to_string()
}

fn default_timeout() -> u64 {
    30
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            base_url: default_base_url(),
            model: default_model(),
            api_key: None,
            timeout_secs: default_timeout(),
        }
    }
}

impl InsightConfig {
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty()))
            .or_else(|| std::env::var("API_KEY").ok().filter(|k| !k.is_empty()))
    }
}

/// Build the provider selected by `config`.
pub fn build_provider(config: &InsightConfig) -> Result<Box<dyn InsightProvider>, InsightError> {
    match config.provider {
        ProviderKind::Gemini => Ok(Box::new(GeminiProvider::new(config)?)),
        ProviderKind::Offline => Ok(Box::new(StaticProvider::new(
            "Keep the regulator switched off when the stove is not in use.",
        ))),
    }
}

// ─── Gemini ───────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct GeminiProvider {
    api_key: Option<String>,
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(config: &InsightConfig) -> Result<Self, InsightError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            api_key: config.resolved_api_key(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            client,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl InsightProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, prompt: &str) -> Result<String, InsightError> {
        let api_key = self.api_key.as_deref().ok_or(InsightError::MissingApiKey)?;
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
        };

        let resp = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let raw = resp.text().await?;
        if !status.is_success() {
            return Err(InsightError::Status {
                status: status.as_u16(),
                body: raw,
            });
        }
        extract_text(&raw)
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

/// Text of the first candidate. No candidates means an empty answer.
fn extract_text(raw: &str) -> Result<String, InsightError> {
    let parsed: GenerateResponse =
        serde_json::from_str(raw).map_err(|e| InsightError::Malformed(e.to_string()))?;
    Ok(parsed
        .candidates
        .first()
        .map(|c| {
            c.content
                .parts
                .iter()
                .filter_map(|p| p.text.as_deref())
                .collect::<String>()
        })
        .unwrap_or_default())
}

// ─── Offline providers ────────────────────────────────────────────────────────

/// Always answers with the same text, optionally after a delay.
#[derive(Debug, Clone)]
pub struct StaticProvider {
    text: String,
    delay: Duration,
}

impl StaticProvider {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl InsightProvider for StaticProvider {
    fn name(&self) -> &str {
        "static"
    }

    async fn generate(&self, _prompt: &str) -> Result<String, InsightError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(self.text.clone())
    }
}

/// Always fails.
#[derive(Debug, Clone, Default)]
pub struct FailingProvider;

#[async_trait]
impl InsightProvider for FailingProvider {
    fn name(&self) -> &str {
        "failing"
    }

    async fn generate(&self, _prompt: &str) -> Result<String, InsightError> {
        Err(InsightError::Malformed("simulated failure".to_string()))
    }
}
