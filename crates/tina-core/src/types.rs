use serde::{Deserialize, Serialize};

// =============================================================================
// Enums
// =============================================================================

/// Discrete category assigned to a user utterance; drives dispatch.
///
/// The standard rule list only ever yields `Greeting`, `Joke`, `Riddle`,
/// `Quote`, `Math`, `Time` and `Unknown`. The remaining variants come from
/// the basic rule list used by the generation path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Greeting,
    Joke,
    Riddle,
    Quote,
    Math,
    Time,
    Farewell,
    Identity,
    Date,
    Weather,
    Help,
    Unknown,
}

impl Intent {
    /// Stable lowercase label, used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Greeting => "greeting",
            Intent::Joke => "joke",
            Intent::Riddle => "riddle",
            Intent::Quote => "quote",
            Intent::Math => "math",
            Intent::Time => "time",
            Intent::Farewell => "farewell",
            Intent::Identity => "identity",
            Intent::Date => "date",
            Intent::Weather => "weather",
            Intent::Help => "help",
            Intent::Unknown => "unknown",
        }
    }
}

/// Author of a transcript entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// Which fallback path handles utterances no built-in intent answers.
///
/// `Search` runs the full chain (knowledge store, then web search, then a
/// canned prompt) with session memory. `Generation` runs the narrower
/// stateless path that hands unknown utterances to the language model.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchMode {
    #[default]
    Search,
    Generation,
}

// =============================================================================
// Conversation records
// =============================================================================

/// One line of a session transcript.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub role: Role,
    pub text: String,
}

impl TranscriptEntry {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }
}

/// The result of one `respond` invocation.
///
/// Only the `{role, text}` summary survives in the transcript; the full
/// triple is returned to the caller for logging and inspection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// Raw text as received.
    pub input: String,
    /// Text after pronoun substitution.
    pub resolved: String,
    /// Reply returned to the user.
    pub reply: String,
    /// Classified intent, `None` when the input was empty.
    pub intent: Option<Intent>,
}

// =============================================================================
// HTTP request/response bodies
// =============================================================================

/// Body of `POST /chat`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub allow_web: bool,
    /// Conversation key; omitted requests share the default session.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Per-request override of the configured dispatch path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<DispatchMode>,
}

/// Body returned by `POST /chat`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
}

/// Body returned by `GET /ping`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PingResponse {
    pub ok: bool,
    pub name: String,
    pub version: String,
}

/// Summary row for `GET /sessions`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub turns: usize,
    pub last_entity: Option<String>,
}

/// Body returned by `GET /sessions/{id}/transcript`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TranscriptResponse {
    pub session_id: String,
    pub last_entity: Option<String>,
    pub transcript: Vec<TranscriptEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_request_defaults() {
        let req: ChatRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.message, "");
        assert!(!req.allow_web);
        assert!(req.session_id.is_none());
        assert!(req.mode.is_none());
    }

    #[test]
    fn test_chat_request_full() {
        let req: ChatRequest = serde_json::from_str(
            r#"{"message":"hi","allow_web":true,"session_id":"abc","mode":"generation"}"#,
        )
        .unwrap();
        assert_eq!(req.message, "hi");
        assert!(req.allow_web);
        assert_eq!(req.session_id.as_deref(), Some("abc"));
        assert_eq!(req.mode, Some(DispatchMode::Generation));
    }

    #[test]
    fn test_transcript_entry_serializes_lowercase_role() {
        let json = serde_json::to_string(&TranscriptEntry::assistant("ok")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","text":"ok"}"#);
    }

    #[test]
    fn test_intent_labels() {
        assert_eq!(Intent::Greeting.as_str(), "greeting");
        assert_eq!(Intent::Unknown.as_str(), "unknown");
        let json = serde_json::to_string(&Intent::Math).unwrap();
        assert_eq!(json, "\"math\"");
    }
}
