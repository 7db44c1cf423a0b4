//! CLI argument definitions for the Tina binary.
//!
//! Uses `clap` with derive macros for ergonomic argument parsing.
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};

use tina_core::types::DispatchMode;

/// Tina - a small conversational assistant served over HTTP.
#[derive(Parser, Debug)]
#[command(name = "tina", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// API server port.
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,

    /// Interface to bind.
    #[arg(long = "host")]
    pub host: Option<String>,

    /// Knowledge document (JSON object).
    #[arg(short = 'k', long = "knowledge")]
    pub knowledge: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Default dispatch path for /chat.
    #[arg(long = "dispatch", value_enum)]
    pub dispatch: Option<DispatchArg>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum DispatchArg {
    Search,
    Generation,
}

impl From<DispatchArg> for DispatchMode {
    fn from(arg: DispatchArg) -> Self {
        match arg {
            DispatchArg::Search => DispatchMode::Search,
            DispatchArg::Generation => DispatchMode::Generation,
        }
    }
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > TINA_CONFIG env var > ~/.tina/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        self.resolve_config_path_with(std::env::var("TINA_CONFIG").ok())
    }

    fn resolve_config_path_with(&self, env: Option<String>) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Some(p) = env.filter(|p| !p.is_empty()) {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the API server port.
    ///
    /// Priority: --port flag > TINA_PORT env var > config file value > 5050.
    pub fn resolve_port(&self, config_port: u16) -> u16 {
        self.resolve_port_with(std::env::var("TINA_PORT").ok(), config_port)
    }

    fn resolve_port_with(&self, env: Option<String>, config_port: u16) -> u16 {
        if let Some(p) = self.port {
            return p;
        }
        if let Some(p) = env.and_then(|v| v.parse::<u16>().ok()) {
            return p;
        }
        if config_port != 0 {
            return config_port;
        }
        5050
    }

    /// Priority: --host flag > config file value.
    pub fn resolve_host(&self, config_host: &str) -> String {
        self.host.clone().unwrap_or_else(|| config_host.to_string())
    }

    /// Priority: --knowledge flag > config file value, with `~` expanded.
    pub fn resolve_knowledge_path(&self, config_path: &str) -> PathBuf {
        match self.knowledge {
            Some(ref p) => p.clone(),
            None => expand_home(config_path),
        }
    }

    /// Priority: --log-level flag > config file value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config_level.to_string())
    }

    /// Priority: --dispatch flag > config file value.
    pub fn resolve_dispatch(&self, config_mode: DispatchMode) -> DispatchMode {
        self.dispatch.map(DispatchMode::from).unwrap_or(config_mode)
    }
}

/// Expand a leading `~/` to the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        if let Some(home) = home_dir() {
            return home.join(rest);
        }
    }
    Path::new(path).to_path_buf()
}

fn home_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    let var = "USERPROFILE";
    #[cfg(not(target_os = "windows"))]
    let var = "HOME";
    std::env::var(var).ok().map(PathBuf::from)
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    match home_dir() {
        Some(home) => home.join(".tina").join("config.toml"),
        None => PathBuf::from("config.toml"),
    }
}
