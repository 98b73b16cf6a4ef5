//! Persistence error taxonomy.

use thiserror::Error;

use parley_core::error::ParleyError;

/// Errors from the persistence gateway.
///
/// `NotFound` and `Conflict` are caller-resolvable; `Connection` covers I/O
/// and driver failures and is retried once by the engine before becoming
/// fatal for the request.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("connection error: {0}")]
    Connection(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Connection(err.to_string())
    }
}

impl From<StoreError> for ParleyError {
    fn from(err: StoreError) -> Self {
        ParleyError::Storage(err.to_string())
    }
}
