//! Conversational core for Tina.
//!
//! Classifies utterances with ordered keyword rules, rewrites pronouns from
//! session memory, answers built-in intents locally and walks the fallback
//! chain (knowledge store, web search, language model, canned prompt) for
//! everything else.

pub mod classifier;
pub mod error;
pub mod math;
pub mod memory;
pub mod orchestrator;
pub mod provider;
pub mod responders;

pub use classifier::{IntentRule, IntentRules, Matcher};
pub use error::{ChatError, MathError};
pub use memory::{
    resolve_pronouns, SessionMemory, SessionRegistry, DEFAULT_MAX_SESSIONS, DEFAULT_SESSION,
    MAX_SESSION_KEY_LEN,
};
pub use orchestrator::{DialogueOrchestrator, EMPTY_INPUT_REPLY};
pub use provider::{GenerationProvider, SearchProvider};
