//! Gemini-style `generateContent` client.
//!
//! The API key travels in the `x-goog-api-key` header and is never put in
//! the URL or logged unmasked.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use tina_chat::GenerationProvider;
use tina_core::config::GenerationConfig;
use tina_core::mask_secret;

use crate::error::ProviderError;

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Part {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// Request body: `{"contents":[{"parts":[{"text": prompt}]}]}`.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest {
    pub contents: Vec<Content>,
}

impl GenerateRequest {
    pub fn from_prompt(prompt: &str) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

/// `candidates[0].content.parts[0].text`.
pub fn extract_text(response: &GenerateResponse) -> Result<String, ProviderError> {
    let candidate = response
        .candidates
        .first()
        .ok_or_else(|| ProviderError::Shape("no candidates".to_string()))?;
    let content = candidate
        .content
        .as_ref()
        .ok_or_else(|| ProviderError::Shape("candidate has no content".to_string()))?;
    content
        .parts
        .first()
        .and_then(|p| p.text.clone())
        .ok_or_else(|| ProviderError::Shape("candidate has no text part".to_string()))
}

// =============================================================================
// Client
// =============================================================================

/// HTTP client for a `generateContent` endpoint. No request timeout.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_key_env: String,
    api_key: Option<String>,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_deref().map(mask_secret))
            .finish()
    }
}

impl GeminiClient {
    pub fn new(config: &GenerationConfig, api_key: Option<String>) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("tina/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key_env: config.api_key_env.clone(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }

    /// `{endpoint}/models/{model}:generateContent`
    pub fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }

    /// Send `prompt` and return the first candidate's text.
    pub async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderError::MissingKey(self.api_key_env.clone()))?;

        debug!(model = %self.model, key = %mask_secret(key), "Calling generation API");

        let response = self
            .http
            .post(self.url())
            .header("x-goog-api-key", key)
            .json(&GenerateRequest::from_prompt(prompt))
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;
        if !status.is_success() {
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).chars().take(200).collect(),
            });
        }

        let parsed: GenerateResponse = serde_json::from_slice(&bytes)?;
        extract_text(&parsed)
    }
}

#[async_trait]
impl GenerationProvider for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, prompt: &str) -> String {
        match self.complete(prompt).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, model = %self.model, "Generation failed");
                format!("(Gemini error: {})", e)
            }
        }
    }
}
