//! Instant-answer web search.
//!
//! Queries `{endpoint}?q=<query>&format=json&no_html=1&skip_disambig=1` and
//! reduces the payload to a single summary line.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use tina_chat::SearchProvider;
use tina_core::config::SearchConfig;

use crate::error::ProviderError;

/// Returned when the payload carries no usable text.
pub const NO_USEFUL_RESULT: &str = "I couldn't find anything useful on the web.";

/// Subset of the instant answer payload that feeds the summary.
#[derive(Debug, Default, Deserialize)]
pub struct InstantAnswer {
    #[serde(rename = "AbstractText", default)]
    pub abstract_text: Value,
    #[serde(rename = "Answer", default)]
    pub answer: Value,
    #[serde(rename = "Definition", default)]
    pub definition: Value,
    #[serde(rename = "RelatedTopics", default)]
    pub related_topics: Vec<RelatedTopic>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RelatedTopic {
    #[serde(rename = "Text", default)]
    pub text: Value,
}

/// First non-empty of `AbstractText`, `Answer`, `Definition`, then the first
/// related topic with text. Non-string fields count as empty.
pub fn extract_summary(payload: &InstantAnswer) -> String {
    [&payload.abstract_text, &payload.answer, &payload.definition]
        .into_iter()
        .chain(payload.related_topics.iter().map(|t| &t.text))
        .find_map(non_empty)
        .map(str::to_string)
        .unwrap_or_else(|| NO_USEFUL_RESULT.to_string())
}

fn non_empty(value: &Value) -> Option<&str> {
    value.as_str().filter(|s| !s.trim().is_empty())
}

/// HTTP client for an instant-answer search endpoint.
#[derive(Debug, Clone)]
pub struct InstantAnswerClient {
    http: reqwest::Client,
    endpoint: String,
}

impl InstantAnswerClient {
    pub fn new(config: &SearchConfig) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("tina/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
        })
    }

    /// Fetch and summarize results for `query`.
    pub async fn lookup(&self, query: &str) -> Result<String, ProviderError> {
        debug!(endpoint = %self.endpoint, "Querying instant answer API");

        let response = self
            .http
            .get(&self.endpoint)
            .query(&[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ])
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

        // The API labels its JSON with a javascript content type.
        let payload: InstantAnswer = serde_json::from_slice(&bytes)?;
        Ok(extract_summary(&payload))
    }
}

#[async_trait]
impl SearchProvider for InstantAnswerClient {
    fn name(&self) -> &str {
        "instant-answer"
    }

    async fn search(&self, query: &str) -> Option<String> {
        match self.lookup(query).await {
            Ok(summary) => Some(summary),
            Err(e) => {
                warn!(error = %e, "Web search failed");
                Some(format!("(Search error: {})", e))
            }
        }
    }
}
