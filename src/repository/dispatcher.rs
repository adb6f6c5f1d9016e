//! Transaction-scoped dispatch of repository operations.
//!
//! Mutating requests run the resolved handler inside
//! [`TransactionManager::transaction`], so every exit path either commits or
//! rolls back. Read requests call the handler directly and never touch the
//! store's transaction commands.
//!
//! Per invocation: `Idle → TransactionOpen → {Committed | RolledBack}`, where
//! `TransactionOpen` is only entered for mutating requests.

use tracing::debug;

use crate::repository::error::RepositoryResult;
use crate::repository::operation::{Operation, OperationTable};
use crate::store::TransactionStore;
use crate::transaction::TransactionManager;

/// Dispatcher bound to one request.
#[derive(Debug)]
pub struct Dispatcher<'a, S: TransactionStore> {
    manager: &'a TransactionManager<S>,
    read: bool,
}

impl<'a, S: TransactionStore> Dispatcher<'a, S> {
    /// `read` marks the request method as exempt from transactions.
    pub fn new(manager: &'a TransactionManager<S>, read: bool) -> Self {
        Self { manager, read }
    }

    pub fn is_read(&self) -> bool {
        self.read
    }

    /// Resolve `name` in `table` and run it against `target`.
    ///
    /// For a mutating request an unknown name fails inside the opened scope,
    /// which is then rolled back.
    pub fn dispatch<T, A, O>(
        &self,
        table: &OperationTable<T, A, O>,
        target: &T,
        name: &str,
        args: A,
    ) -> RepositoryResult<O> {
        if self.read {
            debug!(operation = name, "read request, dispatching without transaction");
            let handler = table.resolve(name)?;
            return handler(target, args);
        }

        debug!(operation = name, "dispatching inside transaction");
        self.manager.transaction(|| {
            let handler = table.resolve(name)?;
            handler(target, args)
        })
    }

    /// [`dispatch`](Self::dispatch) for a standard operation.
    pub fn run<T, A, O>(
        &self,
        table: &OperationTable<T, A, O>,
        target: &T,
        operation: Operation,
        args: A,
    ) -> RepositoryResult<O> {
        self.dispatch(table, target, operation.name(), args)
    }
}
