//! Unified error types surfaced by the runtime API.
//!
//! Wraps failures from the battle worker, repositories and the rules engine so
//! hosts can bubble them up with consistent context.

use thiserror::Error;
use tokio::sync::oneshot;

use battle_core::{BattleError, ErrorSeverity};

pub use crate::repository::RepositoryError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Battle(#[from] BattleError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("battle worker command channel closed")]
    CommandChannelClosed,

    #[error("battle worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("unknown move '{0}' in catalog")]
    UnknownCatalogMove(String),

    #[error("failed to initialise logging: {0}")]
    Logging(String),
}

impl RuntimeError {
    /// Severity used when logging the error.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            RuntimeError::Battle(err) => err.severity(),
            RuntimeError::Repository(_) => ErrorSeverity::Recoverable,
            RuntimeError::UnknownCatalogMove(_) => ErrorSeverity::Validation,
            RuntimeError::CommandChannelClosed
            | RuntimeError::ReplyChannelClosed(_)
            | RuntimeError::Logging(_) => ErrorSeverity::Internal,
        }
    }
}
