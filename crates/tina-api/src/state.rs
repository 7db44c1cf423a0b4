//! Application state shared across all route handlers.

use std::sync::Arc;
use std::time::Instant;

use tina_chat::{DialogueOrchestrator, SessionRegistry};
use tina_core::config::TinaConfig;
use tina_storage::KnowledgeStore;

/// Shared application state.
///
/// All fields use `Arc` for cheap cloning across handler tasks. Session
/// memories carry their own locks inside the registry.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration, fixed at startup.
    pub config: Arc<TinaConfig>,
    /// Dialogue engine and its providers.
    pub orchestrator: Arc<DialogueOrchestrator>,
    /// Per-conversation memories.
    pub sessions: Arc<SessionRegistry>,
    /// The knowledge document consulted by the orchestrator.
    pub knowledge: Arc<KnowledgeStore>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: TinaConfig, orchestrator: DialogueOrchestrator) -> Self {
        let knowledge = Arc::clone(orchestrator.knowledge());
        let sessions = SessionRegistry::with_max_sessions(config.chat.max_sessions);
        Self {
            config: Arc::new(config),
            orchestrator: Arc::new(orchestrator),
            sessions: Arc::new(sessions),
            knowledge,
            start_time: Instant::now(),
        }
    }
}
