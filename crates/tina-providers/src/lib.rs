//! Network adapters behind the orchestrator's provider traits.
//!
//! - [`InstantAnswerClient`]: DuckDuckGo-style instant answer search.
//! - [`GeminiClient`]: Gemini-style `generateContent` text generation.
//!
//! Both convert every failure into reply text at the trait boundary.

pub mod error;
pub mod generation;
pub mod search;

pub use error::ProviderError;
pub use generation::GeminiClient;
pub use search::{InstantAnswerClient, NO_USEFUL_RESULT};
