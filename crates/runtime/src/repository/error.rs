//! Error types raised by repository implementations.

use thiserror::Error;

/// Errors surfaced by repository implementations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("repository lock was poisoned")]
    LockPoisoned,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(String),

    #[error("record {record} not found in room {room}")]
    RecordNotFound { room: String, record: String },

    #[error("no vault stored for player {0}")]
    VaultNotFound(String),
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        RepositoryError::Json(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RepositoryError>;
