//! Tina application binary - composition root.
//!
//! 1. Parse CLI flags and load configuration from TOML
//! 2. Initialize tracing
//! 3. Load the knowledge document
//! 4. Build the search and generation adapters
//! 5. Start the axum REST API server

mod cli;

use std::path::Path;
use std::sync::Arc;

use clap::Parser;

use tina_api::state::AppState;
use tina_chat::{DialogueOrchestrator, GenerationProvider, SearchProvider};
use tina_core::config::{KnowledgeConfig, TinaConfig};
use tina_core::types::DispatchMode;
use tina_core::{mask_secret, TinaError};
use tina_providers::{GeminiClient, InstantAnswerClient};
use tina_storage::KnowledgeStore;

use crate::cli::CliArgs;

/// Load the knowledge document, or an empty one when it is optional.
fn load_knowledge(path: &Path, settings: &KnowledgeConfig) -> Result<KnowledgeStore, TinaError> {
    if !path.exists() {
        if settings.required {
            return Err(TinaError::Knowledge(format!(
                "required knowledge file not found: {}",
                path.display()
            )));
        }
        tracing::warn!(path = %path.display(), "Knowledge file not found, starting with an empty store");
        return Ok(KnowledgeStore::empty(path));
    }

    KnowledgeStore::load(path).or_else(|e| {
        if settings.required {
            return Err(e);
        }
        tracing::warn!(path = %path.display(), error = %e, "Knowledge file unreadable, starting with an empty store");
        Ok(KnowledgeStore::empty(path))
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let config_exists = config_file.exists();
    let mut config = TinaConfig::load(&config_file).or_else(|e| {
        if config_exists {
            Err(e)
        } else {
            Ok(TinaConfig::default())
        }
    })?;

    config.server.port = args.resolve_port(config.server.port);
    config.server.host = args.resolve_host(&config.server.host);
    config.general.log_level = args.resolve_log_level(&config.general.log_level);
    config.chat.dispatch = args.resolve_dispatch(config.chat.dispatch);

    // Tracing. RUST_LOG wins over the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level)),
        )
        .init();

    tracing::info!("Starting Tina v{}", env!("CARGO_PKG_VERSION"));
    if config_exists {
        tracing::info!(path = %config_file.display(), "Configuration loaded");
    } else {
        tracing::warn!(path = %config_file.display(), "Config file not found, using defaults");
    }

    // Knowledge.
    let knowledge_path = args.resolve_knowledge_path(&config.knowledge.path);
    let knowledge = match load_knowledge(&knowledge_path, &config.knowledge) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            tracing::error!(error = %e, "Cannot start without the knowledge file");
            return Err(e.into());
        }
    };

    // Generation credentials.
    let api_key = config.generation_api_key();
    match api_key.as_deref() {
        Some(key) => tracing::info!(
            env = %config.generation.api_key_env,
            key = %mask_secret(key),
            "Generation API key found"
        ),
        None if config.chat.dispatch == DispatchMode::Generation => {
            tracing::error!(
                env = %config.generation.api_key_env,
                "Generation is the default dispatch path but no API key is set"
            );
            return Err(TinaError::Config(format!(
                "{} is not set",
                config.generation.api_key_env
            ))
            .into());
        }
        None => tracing::warn!(
            env = %config.generation.api_key_env,
            "No generation API key; language-model replies will report an error"
        ),
    }

    // Providers.
    let search: Arc<dyn SearchProvider> = Arc::new(InstantAnswerClient::new(&config.search)?);
    let generator: Arc<dyn GenerationProvider> =
        Arc::new(GeminiClient::new(&config.generation, api_key)?);
    tracing::info!(
        search = %config.search.endpoint,
        model = %config.generation.model,
        dispatch = ?config.chat.dispatch,
        "Providers ready"
    );

    let orchestrator = DialogueOrchestrator::new(knowledge, search, generator);
    let server = config.server.clone();
    let state = AppState::new(config, orchestrator);

    // === API server ===

    if let Err(e) = tina_api::start_server(&server, state).await {
        tracing::error!(error = %e, "API server stopped");
        tracing::error!("Try: TINA_PORT={} tina", server.port.saturating_add(1));
        return Err(e.into());
    }

    Ok(())
}
