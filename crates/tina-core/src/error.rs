use thiserror::Error;

/// Top-level error type for the Tina system.
///
/// Subsystem crates define their own error types and implement
/// `From<SubsystemError> for TinaError` so that `?` works across crate
/// boundaries in the composition root.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TinaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Knowledge store error: {0}")]
    Knowledge(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for TinaError {
    fn from(err: toml::de::Error) -> Self {
        TinaError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for TinaError {
    fn from(err: serde_json::Error) -> Self {
        TinaError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Tina operations.
pub type Result<T> = std::result::Result<T, TinaError>;
