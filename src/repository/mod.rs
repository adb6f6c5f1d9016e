//! Repositories and transaction-scoped dispatch.
//!
//! Mutating operations are looked up by name in an [`OperationTable`] and run
//! through a [`Dispatcher`], which wraps them in a transaction unless the
//! request method is a read. [`Repository`] ties a request context, a base
//! query and an operation table together.

mod base;
mod dispatcher;
mod error;
mod operation;

pub use base::Repository;
pub use dispatcher::Dispatcher;
pub use error::{RepositoryError, RepositoryResult};
pub use operation::{Handler, Operation, OperationTable};
