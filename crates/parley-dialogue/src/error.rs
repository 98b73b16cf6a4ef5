//! Error types for the dialogue pipeline.

use parley_core::error::ParleyError;
use parley_storage::StoreError;

/// Rejections from message validation. Never persisted; surfaced to the
/// caller immediately.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("message cannot be empty")]
    Empty,
    #[error("message shorter than {0} characters")]
    TooShort(usize),
    #[error("message exceeds maximum length of {0} characters")]
    TooLong(usize),
    #[error("message contains disallowed content")]
    InjectionSuspected,
}

/// Errors from the dialogue engine.
///
/// `Validation` is client-caused; the rest are system-caused and reach the
/// caller only after the engine's single retry has been spent.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("session not found: {0}")]
    SessionNotFound(String),
    #[error("message not found: {0}")]
    MessageNotFound(String),
    #[error("feedback already recorded: {0}")]
    FeedbackConflict(String),
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<EngineError> for ParleyError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Validation(e) => ParleyError::Dialogue(e.to_string()),
            other => ParleyError::Storage(other.to_string()),
        }
    }
}

impl EngineError {
    /// Map a gateway error, attributing `NotFound` to a session id.
    pub(crate) fn from_session_store(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => EngineError::SessionNotFound(id),
            other => EngineError::Storage(other.to_string()),
        }
    }
}
