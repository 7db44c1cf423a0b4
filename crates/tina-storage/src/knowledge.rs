//! Flat key-value knowledge document backed by a single JSON file.
//!
//! The whole document is held in memory behind an `RwLock`. There is no
//! partial-update API: callers either read entries or replace the document
//! wholesale and write it back with [`KnowledgeStore::save`].

use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use tina_core::error::{Result, TinaError};

/// In-memory view of the knowledge file.
pub struct KnowledgeStore {
    path: PathBuf,
    entries: RwLock<Map<String, Value>>,
}

impl KnowledgeStore {
    /// Load the knowledge document at `path`.
    ///
    /// Fails if the file cannot be read, is not valid JSON, or its top level
    /// is not an object.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let value: Value = serde_json::from_str(&content)?;
        let entries = match value {
            Value::Object(map) => map,
            other => {
                return Err(TinaError::Knowledge(format!(
                    "expected a JSON object at the top level of {}, found {}",
                    path.display(),
                    json_kind(&other)
                )))
            }
        };
        info!(path = %path.display(), entries = entries.len(), "Knowledge store loaded");
        Ok(Self {
            path: path.to_path_buf(),
            entries: RwLock::new(entries),
        })
    }

    /// An empty store that will be written to `path` on save.
    pub fn empty(path: &Path) -> Self {
        Self::with_entries(path, Map::new())
    }

    /// A store pre-populated with `entries` (not yet written to disk).
    pub fn with_entries(path: &Path, entries: Map<String, Value>) -> Self {
        Self {
            path: path.to_path_buf(),
            entries: RwLock::new(entries),
        }
    }

    /// Path the store was loaded from and saves to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of top-level keys.
    pub fn len(&self) -> Result<usize> {
        self.entries
            .read()
            .map(|e| e.len())
            .map_err(|e| TinaError::Knowledge(format!("knowledge lock poisoned: {}", e)))
    }

    pub fn is_empty(&self) -> Result<bool> {
        self.len().map(|n| n == 0)
    }

    /// Look up a user utterance.
    ///
    /// The utterance is trimmed and compared case-insensitively against the
    /// keys; an exact key match wins over a case-insensitive one.
    pub fn lookup(&self, query: &str) -> Option<Value> {
        let needle = query.trim();
        if needle.is_empty() {
            return None;
        }
        let entries = match self.entries.read() {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "Knowledge lock poisoned, treating lookup as a miss");
                return None;
            }
        };
        if let Some(v) = entries.get(needle) {
            return Some(v.clone());
        }
        let lowered = needle.to_lowercase();
        entries
            .iter()
            .find(|(k, _)| k.trim().to_lowercase() == lowered)
            .map(|(_, v)| v.clone())
    }

    /// Look up an utterance and render the hit as reply text.
    ///
    /// String values are returned verbatim; any other JSON value is
    /// serialized. `null` and empty strings count as misses.
    pub fn reply_for(&self, query: &str) -> Option<String> {
        let value = self.lookup(query)?;
        let text = match value {
            Value::Null => return None,
            Value::String(s) => s,
            other => other.to_string(),
        };
        if text.trim().is_empty() {
            None
        } else {
            debug!(query_len = query.len(), "Knowledge store hit");
            Some(text)
        }
    }

    /// Copy of the whole document.
    pub fn snapshot(&self) -> Result<Map<String, Value>> {
        self.entries
            .read()
            .map(|e| e.clone())
            .map_err(|e| TinaError::Knowledge(format!("knowledge lock poisoned: {}", e)))
    }

    /// Replace the whole document in memory. Call [`save`](Self::save) to
    /// persist it.
    pub fn replace(&self, entries: Map<String, Value>) -> Result<()> {
        let mut guard = self
            .entries
            .write()
            .map_err(|e| TinaError::Knowledge(format!("knowledge lock poisoned: {}", e)))?;
        *guard = entries;
        Ok(())
    }

    /// Write the whole document back to its file.
    pub fn save(&self) -> Result<()> {
        let entries = self.snapshot()?;
        let count = entries.len();
        let snapshot = Value::Object(entries);
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(&snapshot)?;
        std::fs::write(&self.path, content)?;
        info!(path = %self.path.display(), entries = count, "Knowledge store saved");
        Ok(())
    }
}

impl std::fmt::Debug for KnowledgeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnowledgeStore")
            .field("path", &self.path)
            .field("entries", &self.entries.read().map(|e| e.len()).ok())
            .finish()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
