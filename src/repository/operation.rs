//! Named operations and their lookup table.

use std::collections::HashMap;
use std::fmt;

use crate::repository::error::{RepositoryError, RepositoryResult};

/// The standard mutating operations of a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Store,
    Update,
    Delete,
}

impl Operation {
    pub const ALL: [Operation; 3] = [Operation::Store, Operation::Update, Operation::Delete];

    /// Name used for lookup.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Store => "store",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Operation {
    type Err = RepositoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .into_iter()
            .find(|op| op.name() == s)
            .ok_or_else(|| RepositoryError::MethodNotFound(s.to_string()))
    }
}

/// A registered operation handler.
pub type Handler<T, A, O> = Box<dyn Fn(&T, A) -> RepositoryResult<O> + Send + Sync>;

/// Operation name → handler.
///
/// `T` is the repository, `A` the argument type, `O` the output type.
pub struct OperationTable<T, A, O> {
    handlers: HashMap<String, Handler<T, A, O>>,
}

impl<T, A, O> Default for OperationTable<T, A, O> {
    fn default() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }
}

impl<T, A, O> OperationTable<T, A, O> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one of the standard operations.
    pub fn register<F>(self, operation: Operation, handler: F) -> Self
    where
        F: Fn(&T, A) -> RepositoryResult<O> + Send + Sync + 'static,
    {
        self.register_named(operation.name(), handler)
    }

    /// Register a handler under any name. A later registration replaces an
    /// earlier one with the same name.
    pub fn register_named<F>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&T, A) -> RepositoryResult<O> + Send + Sync + 'static,
    {
        self.handlers.insert(name.into(), Box::new(handler));
        self
    }

    /// Look up a handler.
    pub fn resolve(&self, name: &str) -> RepositoryResult<&Handler<T, A, O>> {
        self.handlers
            .get(name)
            .ok_or_else(|| RepositoryError::MethodNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl<T, A, O> fmt::Debug for OperationTable<T, A, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationTable")
            .field("operations", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter;

    #[test]
    fn test_resolve_registered() {
        let table: OperationTable<Counter, i32, i32> = OperationTable::new()
            .register(Operation::Store, |_, n| Ok(n + 1))
            .register_named("archive", |_, n| Ok(n * 2));

        assert_eq!(table.resolve("store").unwrap()(&Counter, 1), Ok(2));
        assert_eq!(table.resolve("archive").unwrap()(&Counter, 4), Ok(8));
        assert_eq!(table.names(), vec!["archive", "store"]);
    }

    #[test]
    fn test_resolve_unknown() {
        let table: OperationTable<Counter, (), ()> = OperationTable::new();
        assert!(matches!(
            table.resolve("update"),
            Err(RepositoryError::MethodNotFound(name)) if name == "update"
        ));
    }

    #[test]
    fn test_operation_names() {
        for op in Operation::ALL {
            assert_eq!(op.name().parse::<Operation>().unwrap(), op);
        }
        assert!("destroy".parse::<Operation>().is_err());
    }
}
