use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;
use crate::types::DispatchMode;

/// Top-level configuration for the Tina server.
///
/// Loaded from `~/.tina/config.toml` by default. Every section falls back to
/// its defaults when omitted, so an empty file is a valid configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TinaConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub knowledge: KnowledgeConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

impl TinaConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: TinaConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Read the generation API key from the environment variable named in
    /// `[generation] api_key_env`. Empty values count as missing.
    pub fn generation_api_key(&self) -> Option<String> {
        std::env::var(&self.generation.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5050,
        }
    }
}

/// Knowledge store file settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeConfig {
    /// Path to the JSON knowledge document.
    pub path: String,
    /// Refuse to start when the file is missing or unreadable.
    pub required: bool,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            path: "~/.tina/knowledge.json".to_string(),
            required: false,
        }
    }
}

/// Instant-answer search provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Base URL of the instant-answer endpoint.
    pub endpoint: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.duckduckgo.com/".to_string(),
            timeout_secs: 8,
        }
    }
}

/// Language-model provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Base URL of the generation API (without the `/models/...` suffix).
    pub endpoint: String,
    /// Model name used in the `generateContent` path.
    pub model: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-1.5-flash".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
        }
    }
}

/// Dialogue settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Dispatch path used by `/chat` when the request does not pick one.
    pub dispatch: DispatchMode,
    /// Most conversations kept at once; new session keys are refused past it.
    pub max_sessions: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            dispatch: DispatchMode::Search,
            max_sessions: 10_000,
        }
    }
}

/// Mask a secret for diagnostics: keep the first six characters only.
pub fn mask_secret(secret: &str) -> String {
    let prefix: String = secret.chars().take(6).collect();
    format!("{}...", prefix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TinaError;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = TinaConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 5050);
        assert!(!config.knowledge.required);
        assert_eq!(config.search.timeout_secs, 8);
        assert_eq!(config.generation.model, "gemini-1.5-flash");
        assert_eq!(config.generation.api_key_env, "GEMINI_API_KEY");
        assert_eq!(config.chat.dispatch, DispatchMode::Search);
        assert_eq!(config.chat.max_sessions, 10_000);
    }

    #[test]
    fn test_load_valid_config() {
        let content = r#"
[general]
log_level = "debug"

[server]
host = "127.0.0.1"
port = 6060

[knowledge]
path = "/srv/tina/knowledge.json"
required = true

[search]
endpoint = "http://localhost:9000/"
timeout_secs = 3

[generation]
model = "gemini-pro"
api_key_env = "TINA_TEST_KEY"

[chat]
dispatch = "generation"
max_sessions = 50
"#;
        let file = create_temp_config(content);
        let config = TinaConfig::load(file.path()).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 6060);
        assert_eq!(config.knowledge.path, "/srv/tina/knowledge.json");
        assert!(config.knowledge.required);
        assert_eq!(config.search.endpoint, "http://localhost:9000/");
        assert_eq!(config.search.timeout_secs, 3);
        assert_eq!(config.generation.model, "gemini-pro");
        assert_eq!(config.generation.api_key_env, "TINA_TEST_KEY");
        assert_eq!(config.chat.dispatch, DispatchMode::Generation);
        assert_eq!(config.chat.max_sessions, 50);
    }

    #[test]
    fn test_load_partial_config_uses_defaults() {
        let content = r#"
[server]
port = 7070
"#;
        let file = create_temp_config(content);
        let config = TinaConfig::load(file.path()).unwrap();
        assert_eq!(config.server.port, 7070);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.search.timeout_secs, 8);
        assert_eq!(config.chat.dispatch, DispatchMode::Search);
    }

    #[test]
    fn test_config_empty_toml_uses_all_defaults() {
        let file = create_temp_config("");
        let config = TinaConfig::load(file.path()).unwrap();
        assert_eq!(config.server.port, 5050);
        assert_eq!(config.general.log_level, "info");
    }

    #[test]
    fn test_config_load_invalid_toml() {
        let file = create_temp_config("[server\nport = ");
        let result = TinaConfig::load(file.path());
        assert!(matches!(result, Err(TinaError::Config(_))));
    }

    #[test]
    fn test_unknown_dispatch_mode_rejected() {
        let file = create_temp_config("[chat]\ndispatch = \"telepathy\"\n");
        assert!(TinaConfig::load(file.path()).is_err());
    }

    #[test]
    fn test_generation_api_key_from_env() {
        let mut config = TinaConfig::default();
        config.generation.api_key_env = "TINA_CONFIG_TEST_KEY_PRESENT".to_string();
        std::env::set_var("TINA_CONFIG_TEST_KEY_PRESENT", "AIzaSyExample");
        assert_eq!(config.generation_api_key().as_deref(), Some("AIzaSyExample"));

        config.generation.api_key_env = "TINA_CONFIG_TEST_KEY_BLANK".to_string();
        std::env::set_var("TINA_CONFIG_TEST_KEY_BLANK", "   ");
        assert!(config.generation_api_key().is_none());

        config.generation.api_key_env = "TINA_CONFIG_TEST_KEY_UNSET".to_string();
        assert!(config.generation_api_key().is_none());
    }

    #[test]
    fn test_mask_secret_keeps_prefix_only() {
        assert_eq!(mask_secret("AIzaSyABCDEFGHIJ"), "AIzaSy...");
        assert_eq!(mask_secret("abc"), "abc...");
        assert_eq!(mask_secret(""), "...");
    }
}
