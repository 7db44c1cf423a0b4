use thiserror::Error;

use tina_core::TinaError;

/// Failures inside a provider adapter.
///
/// These never reach the orchestrator as errors; the adapters render them
/// into the `(Search error: ...)` / `(Gemini error: ...)` reply strings.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid JSON in response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no API key configured (set {0})")]
    MissingKey(String),

    #[error("unexpected response: {0}")]
    Shape(String),
}

impl From<ProviderError> for TinaError {
    fn from(err: ProviderError) -> Self {
        TinaError::Provider(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProviderError::MissingKey("GEMINI_API_KEY".to_string());
        assert_eq!(err.to_string(), "no API key configured (set GEMINI_API_KEY)");

        let err = ProviderError::Status {
            status: 503,
            body: "unavailable".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 503: unavailable");
    }

    #[test]
    fn test_into_tina_error() {
        let err: TinaError = ProviderError::Shape("no candidates".to_string()).into();
        assert!(matches!(err, TinaError::Provider(ref m) if m.contains("no candidates")));
    }
}
