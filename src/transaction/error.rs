//! Transaction error types.

use thiserror::Error;

use crate::store::StoreError;

/// Result type for transaction operations.
pub type TransactionResult<T> = Result<T, TransactionError>;

/// Errors that can occur during transaction operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransactionError {
    /// The external store rejected a command.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// An inner scope rolled back under flat nesting, so the outermost commit
    /// was turned into a rollback.
    #[error("transaction was marked rollback-only by an inner scope and has been rolled back")]
    RollbackOnly,
}

impl TransactionError {
    /// Check if the error originated in the store.
    pub fn is_store_failure(&self) -> bool {
        matches!(self, TransactionError::Store(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_failure() {
        let err: TransactionError = StoreError::CommitRejected("disk full".into()).into();
        assert!(err.is_store_failure());
        assert_eq!(err.to_string(), "store error: commit rejected: disk full");
        assert!(!TransactionError::RollbackOnly.is_store_failure());
    }
}
