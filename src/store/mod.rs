//! store layer for txquery
//!
//! this module describes the external transactional resource the transaction
//! manager drives. The upper layers (transaction manager, dispatcher) only talk
//! to a store through the [`TransactionStore`] trait and never issue SQL.
//!
//!  # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   TransactionManager                        │
//! │        (nesting depth, savepoints, rollback-all)            │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//!                ┌───────────────────────────┐
//!                │    dyn TransactionStore   │
//!                │ begin / commit / rollback │
//!                │  savepoint / release / to │
//!                └───────────────────────────┘
//!                              │
//!              ┌───────────────┴───────────────┐
//!              ▼                               ▼
//!       ┌─────────────┐                 ┌─────────────┐
//!       │ MemoryStore │                 │  your ORM   │
//!       │  (journal)  │                 │ connection  │
//!       └─────────────┘                 └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use txquery::store::{MemoryStore, TransactionStore};
//!
//! let mut store = MemoryStore::new();
//! store.begin()?;
//! store.commit()?;
//! assert_eq!(store.journal().len(), 2);
//! ```

mod error;
mod memory;

pub use error::{StoreError, StoreResult};
pub use memory::{MemoryStore, StoreCall};

/// The outbound contract to an external transactional data store.
///
/// Calls are synchronous. Only `begin`/`commit`/`rollback` are required;
/// stores that can nest through savepoints override the savepoint methods
/// and report it through [`TransactionStore::supports_savepoints`].
pub trait TransactionStore: Send {
    /// Open a top-level transaction.
    fn begin(&mut self) -> StoreResult<()>;

    /// Commit the current top-level transaction.
    fn commit(&mut self) -> StoreResult<()>;

    /// Roll back the current top-level transaction.
    fn rollback(&mut self) -> StoreResult<()>;

    /// Whether the savepoint methods are implemented.
    fn supports_savepoints(&self) -> bool {
        false
    }

    /// Create a named savepoint inside the open transaction.
    fn savepoint(&mut self, name: &str) -> StoreResult<()> {
        Err(StoreError::Unsupported(format!("SAVEPOINT {name}")))
    }

    /// Release (keep) the work done since the named savepoint.
    fn release_savepoint(&mut self, name: &str) -> StoreResult<()> {
        Err(StoreError::Unsupported(format!("RELEASE SAVEPOINT {name}")))
    }

    /// Discard the work done since the named savepoint.
    fn rollback_to_savepoint(&mut self, name: &str) -> StoreResult<()> {
        Err(StoreError::Unsupported(format!("ROLLBACK TO SAVEPOINT {name}")))
    }
}

impl<S: TransactionStore + ?Sized> TransactionStore for Box<S> {
    fn begin(&mut self) -> StoreResult<()> {
        (**self).begin()
    }

    fn commit(&mut self) -> StoreResult<()> {
        (**self).commit()
    }

    fn rollback(&mut self) -> StoreResult<()> {
        (**self).rollback()
    }

    fn supports_savepoints(&self) -> bool {
        (**self).supports_savepoints()
    }

    fn savepoint(&mut self, name: &str) -> StoreResult<()> {
        (**self).savepoint(name)
    }

    fn release_savepoint(&mut self, name: &str) -> StoreResult<()> {
        (**self).release_savepoint(name)
    }

    fn rollback_to_savepoint(&mut self, name: &str) -> StoreResult<()> {
        (**self).rollback_to_savepoint(name)
    }
}
