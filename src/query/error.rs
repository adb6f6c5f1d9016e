//! Query-string translation errors.

use thiserror::Error;

/// Result type for translation operations.
pub type QueryResult<T> = Result<T, QueryError>;

/// Errors raised while turning query-string options into query calls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("malformed sort token `{0}`: expected `column|direction`")]
    MalformedSort(String),

    #[error("invalid sort direction `{0}`: expected `asc` or `desc`")]
    InvalidSortDirection(String),

    #[error("invalid paginate value `{0}`")]
    InvalidPagination(String),

    #[error("unknown query option: {0}")]
    UnknownOption(String),
}
