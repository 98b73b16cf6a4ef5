//! Parley API crate - axum HTTP server and route handlers.
//!
//! Exposes the dialogue engine over REST: session creation, message
//! handling, conversation history, session context, feedback, and a
//! health check.

pub mod error;
pub mod handlers;
pub mod rate_limit;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, serve};
pub use state::AppState;
