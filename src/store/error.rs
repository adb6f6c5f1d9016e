//! Store error types
//!
//! Errors raised by an external transactional store. They travel up through the
//! transaction manager unmodified.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// the error type for store calls
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// the store refused to open a transaction
    #[error("begin rejected: {0}")]
    BeginRejected(String),

    /// the store refused to commit
    #[error("commit rejected: {0}")]
    CommitRejected(String),

    /// the store refused to roll back
    #[error("rollback rejected: {0}")]
    RollbackRejected(String),

    /// a savepoint command failed
    #[error("savepoint {name} failed: {reason}")]
    Savepoint { name: String, reason: String },

    /// commit/rollback issued with no open transaction
    #[error("no transaction is open")]
    NoTransaction,

    /// the store does not implement the command
    #[error("unsupported store command: {0}")]
    Unsupported(String),

    /// connection level failure
    #[error("connection error: {0}")]
    Connection(String),
}

impl StoreError {
    /// Check if this error came from the store refusing a command, rather than
    /// from the connection itself.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            StoreError::BeginRejected(_)
                | StoreError::CommitRejected(_)
                | StoreError::RollbackRejected(_)
                | StoreError::Savepoint { .. }
        )
    }
}
