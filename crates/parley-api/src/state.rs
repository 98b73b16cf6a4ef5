//! Application state shared across all route handlers.

use std::sync::Arc;

use parley_core::config::ParleyConfig;
use parley_dialogue::DialogueEngine;
use parley_storage::SqliteGateway;

/// Shared application state.
///
/// All fields use `Arc` for cheap cloning across handler tasks; the
/// engine itself is immutable after construction.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<ParleyConfig>,
    /// The dialogue engine over SQLite persistence.
    pub engine: Arc<DialogueEngine<SqliteGateway>>,
}

impl AppState {
    pub fn new(config: ParleyConfig, engine: DialogueEngine<SqliteGateway>) -> Self {
        Self {
            config: Arc::new(config),
            engine: Arc::new(engine),
        }
    }
}
