//! Records describing an unhandled failure at the request boundary.

use std::fmt;
use std::panic::Location;

use serde::Serialize;

/// What the failure hook logs when it rolls back every open scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureReport {
    /// Type of the failure, e.g. `txquery::repository::RepositoryError`.
    pub kind: String,
    /// Display text of the failure.
    pub message: String,
    /// `file:line` where the failure was captured.
    pub location: String,
}

impl FailureReport {
    pub fn new(
        kind: impl Into<String>,
        message: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            location: location.into(),
        }
    }

    /// Capture an error together with the caller's source location.
    #[track_caller]
    pub fn capture<E>(error: &E) -> Self
    where
        E: std::error::Error + ?Sized,
    {
        let location = Location::caller();
        Self::new(
            std::any::type_name::<E>(),
            error.to_string(),
            format!("{}:{}", location.file(), location.line()),
        )
    }

    /// Build a report from a panic payload, located at the caller.
    #[track_caller]
    pub fn from_panic(payload: &(dyn std::any::Any + Send)) -> Self {
        let location = Location::caller();
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        Self::new(
            "panic",
            message,
            format!("{}:{}", location.file(), location.line()),
        )
    }
}

impl fmt::Display for FailureReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}: {}", self.kind, self.location, self.message)
    }
}
