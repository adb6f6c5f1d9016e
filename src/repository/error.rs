//! Repository error types.

use thiserror::Error;

use crate::query::QueryError;
use crate::store::StoreError;
use crate::transaction::TransactionError;

/// Result type for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Errors surfaced by repository operations and the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    /// No handler is registered under the requested operation name.
    #[error("method '{0}' doesn't exist")]
    MethodNotFound(String),

    #[error("transaction error: {0}")]
    Transaction(#[from] TransactionError),

    #[error("query error: {0}")]
    Query(#[from] QueryError),

    /// A handler rejected its input.
    #[error("operation failed: {0}")]
    Operation(String),

    /// The ORM layer failed to run a query.
    #[error("fetch failed: {0}")]
    Fetch(String),
}

impl From<StoreError> for RepositoryError {
    fn from(e: StoreError) -> Self {
        RepositoryError::Transaction(TransactionError::Store(e))
    }
}

impl RepositoryError {
    /// Check if the error is the caller's fault rather than the backend's.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            RepositoryError::MethodNotFound(_)
                | RepositoryError::Query(_)
                | RepositoryError::Operation(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors() {
        assert!(RepositoryError::MethodNotFound("archive".into()).is_client_error());
        assert!(RepositoryError::Query(QueryError::MalformedSort("x".into())).is_client_error());
        assert!(!RepositoryError::from(StoreError::NoTransaction).is_client_error());
    }

    #[test]
    fn test_method_not_found_message() {
        assert_eq!(
            RepositoryError::MethodNotFound("archive".into()).to_string(),
            "method 'archive' doesn't exist"
        );
    }
}
