//! Seams to the outside world.
//!
//! The orchestrator only talks to the network through these traits.
//! Implementations must never fail past this boundary: transport or parse
//! failures are reported as reply text.

use async_trait::async_trait;

/// Web search returning the best available summary for a query.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Summary text, a fixed "no useful result" message, or an error
    /// description. `None` means the provider produced nothing at all.
    async fn search(&self, query: &str) -> Option<String>;
}

/// Language-model text generation.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Generated text, or an error description.
    async fn generate(&self, prompt: &str) -> String;
}
