//! Shared building blocks for Tina: configuration, the top-level error type,
//! and the domain/wire types exchanged between the chat engine and its host.

pub mod config;
pub mod error;
pub mod types;

pub use config::{mask_secret, TinaConfig};
pub use error::{Result, TinaError};
pub use types::*;
