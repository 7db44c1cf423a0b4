//! Session memory and pronoun substitution.
//!
//! A [`SessionMemory`] holds the last entity a web search answered for and
//! an append-only transcript. Memories are handed out by a
//! [`SessionRegistry`], one per conversation key, each behind its own async
//! mutex so that turns of one conversation never interleave. Requests that
//! name no conversation share [`DEFAULT_SESSION`], so a client that never
//! sends a key sees one process-wide memory.
//!
//! The registry holds at most `max_sessions` named conversations and rejects
//! keys longer than [`MAX_SESSION_KEY_LEN`]. The default conversation does
//! not count against the limit. Conversations live until [`SessionRegistry::remove`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::Mutex as AsyncMutex;

use tina_core::types::{Role, SessionSummary, TranscriptEntry, TranscriptResponse};

use crate::error::ChatError;

/// Key of the shared conversation used when a request names none.
pub const DEFAULT_SESSION: &str = "default";

/// Named conversations kept by [`SessionRegistry::new`].
pub const DEFAULT_MAX_SESSIONS: usize = 10_000;

/// Longest accepted conversation key, in characters, after trimming.
pub const MAX_SESSION_KEY_LEN: usize = 128;

/// Literal substrings rewritten to the remembered entity, in order.
const PRONOUNS: [&str; 3] = ["her", "him", "their"];

// =============================================================================
// SessionMemory
// =============================================================================

/// Per-conversation state mutated by the orchestrator after each turn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionMemory {
    last_entity: Option<String>,
    transcript: Vec<TranscriptEntry>,
}

impl SessionMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_entity(&self) -> Option<&str> {
        self.last_entity.as_deref()
    }

    pub fn set_last_entity(&mut self, entity: impl Into<String>) {
        self.last_entity = Some(entity.into());
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    /// Append one entry. The transcript never shrinks or reorders.
    pub fn record(&mut self, role: Role, text: impl Into<String>) {
        self.transcript.push(TranscriptEntry {
            role,
            text: text.into(),
        });
    }

    /// Rewrite pronouns in `text` using this memory's last entity.
    pub fn resolve(&self, text: &str) -> String {
        resolve_pronouns(text, self.last_entity())
    }
}

/// Blind pronoun substitution.
///
/// With no entity the text is returned unchanged. Otherwise, for each of
/// `her`, `him`, `their` in turn: if the lower-cased text contains it, every
/// case-sensitive occurrence in the original text is replaced by `entity`.
/// This is substring replacement, not coreference resolution: "where"
/// becomes "w<entity>e", and a capitalized "Her" is detected but left in
/// place. Replacements run one after another, so an entity that itself
/// contains a later pronoun is rewritten again.
pub fn resolve_pronouns(text: &str, entity: Option<&str>) -> String {
    let Some(entity) = entity else {
        return text.to_string();
    };
    let mut resolved = text.to_string();
    for pronoun in PRONOUNS {
        if resolved.to_lowercase().contains(pronoun) {
            resolved = resolved.replace(pronoun, entity);
        }
    }
    resolved
}

// =============================================================================
// SessionRegistry
// =============================================================================

/// Concurrent map from conversation key to its memory.
#[derive(Debug)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, Arc<AsyncMutex<SessionMemory>>>>,
    max_sessions: usize,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::with_max_sessions(DEFAULT_MAX_SESSIONS)
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_sessions(max_sessions: usize) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            max_sessions,
        }
    }

    pub fn max_sessions(&self) -> usize {
        self.max_sessions
    }

    /// Memory for `key` (or the default conversation), created on first use.
    ///
    /// Creating a new named conversation fails with
    /// [`ChatError::SessionLimit`] once `max_sessions` are held.
    pub fn session(&self, key: Option<&str>) -> Result<Arc<AsyncMutex<SessionMemory>>, ChatError> {
        let key = normalize_key(key);
        if key.chars().count() > MAX_SESSION_KEY_LEN {
            return Err(ChatError::SessionKeyTooLong(MAX_SESSION_KEY_LEN));
        }

        let mut sessions = self
            .sessions
            .lock()
            .map_err(|e| ChatError::SessionLock(e.to_string()))?;
        if let Some(memory) = sessions.get(key) {
            return Ok(Arc::clone(memory));
        }

        if key != DEFAULT_SESSION {
            let named = sessions.len() - usize::from(sessions.contains_key(DEFAULT_SESSION));
            if named >= self.max_sessions {
                tracing::warn!(limit = self.max_sessions, "Session limit reached");
                return Err(ChatError::SessionLimit(self.max_sessions));
            }
        }

        let memory = Arc::new(AsyncMutex::new(SessionMemory::new()));
        sessions.insert(key.to_string(), Arc::clone(&memory));
        Ok(memory)
    }

    /// Memory for an existing `key`; never creates one.
    pub fn existing(&self, key: &str) -> Result<Arc<AsyncMutex<SessionMemory>>, ChatError> {
        let sessions = self
            .sessions
            .lock()
            .map_err(|e| ChatError::SessionLock(e.to_string()))?;
        sessions
            .get(normalize_key(Some(key)))
            .cloned()
            .ok_or_else(|| ChatError::SessionNotFound(key.to_string()))
    }

    /// Register an empty conversation under `key`. An existing conversation
    /// with the same key is kept as is.
    pub fn create(&self, key: &str) -> Result<(), ChatError> {
        self.session(Some(key)).map(|_| ())
    }

    /// Forget the conversation under `key`. A turn already holding its
    /// memory finishes against the detached copy.
    pub fn remove(&self, key: &str) -> Result<(), ChatError> {
        let mut sessions = self
            .sessions
            .lock()
            .map_err(|e| ChatError::SessionLock(e.to_string()))?;
        sessions
            .remove(normalize_key(Some(key)))
            .map(|_| ())
            .ok_or_else(|| ChatError::SessionNotFound(key.to_string()))
    }

    pub fn len(&self) -> Result<usize, ChatError> {
        self.sessions
            .lock()
            .map(|s| s.len())
            .map_err(|e| ChatError::SessionLock(e.to_string()))
    }

    pub fn is_empty(&self) -> Result<bool, ChatError> {
        self.len().map(|n| n == 0)
    }

    /// Snapshot of one conversation.
    pub async fn transcript(&self, key: &str) -> Result<TranscriptResponse, ChatError> {
        let memory = self.existing(key)?;
        let memory = memory.lock().await;
        Ok(TranscriptResponse {
            session_id: key.to_string(),
            last_entity: memory.last_entity().map(str::to_string),
            transcript: memory.transcript().to_vec(),
        })
    }

    /// Summaries of all conversations, sorted by key.
    pub async fn summaries(&self) -> Result<Vec<SessionSummary>, ChatError> {
        let entries: Vec<(String, Arc<AsyncMutex<SessionMemory>>)> = {
            let sessions = self
                .sessions
                .lock()
                .map_err(|e| ChatError::SessionLock(e.to_string()))?;
            sessions
                .iter()
                .map(|(k, v)| (k.clone(), Arc::clone(v)))
                .collect()
        };

        let mut summaries = Vec::with_capacity(entries.len());
        for (key, memory) in entries {
            let memory = memory.lock().await;
            summaries.push(SessionSummary {
                session_id: key,
                turns: memory.transcript().len(),
                last_entity: memory.last_entity().map(str::to_string),
            });
        }
        summaries.sort_by(|a, b| a.session_id.cmp(&b.session_id));
        Ok(summaries)
    }
}

fn normalize_key(key: Option<&str>) -> &str {
    match key.map(str::trim) {
        Some(k) if !k.is_empty() => k,
        _ => DEFAULT_SESSION,
    }
}

// =============================================================================
// Tests
// =============================================================================
