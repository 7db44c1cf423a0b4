//! Tina API crate - axum HTTP host for the dialogue engine.
//!
//! Exposes `/ping`, `/health`, `/chat`, session inspection and the
//! knowledge document over JSON.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
