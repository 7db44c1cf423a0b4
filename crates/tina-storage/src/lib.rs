//! Tina storage crate - the JSON knowledge document.
//!
//! The knowledge store is read once at startup, consulted before any network
//! lookup, and can only be rewritten as a whole.

pub mod knowledge;

pub use knowledge::KnowledgeStore;
