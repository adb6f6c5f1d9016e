//! Transaction management for txquery.
//!
//! This module tracks nested transaction scopes against one external store.
//! The outermost scope is a store transaction; inner scopes map onto
//! savepoints, are merely counted, or pass straight through, depending on the
//! [`NestingMode`]. When a request fails without handling the error, every
//! open scope is rolled back.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   TransactionManager                        │
//! │   (request-scoped: depth, savepoints, failure hook)         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!        ┌─────────────────────┼─────────────────────┐
//!        │                     │                     │
//!        ▼                     ▼                     ▼
//!  ┌─────────────┐       ┌─────────────┐       ┌─────────────┐
//!  │ ScopeGuard  │       │   Nesting   │       │  Failure    │
//!  │   (drop)    │       │    Mode     │       │   Report    │
//!  └─────────────┘       └─────────────┘       └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use txquery::store::MemoryStore;
//! use txquery::transaction::TransactionManager;
//!
//! let manager = TransactionManager::new(MemoryStore::new());
//!
//! // Explicit scopes
//! manager.begin_transaction()?;
//! manager.commit()?;  // or manager.rollback()?;
//!
//! // Closure scopes
//! let id = manager.transaction(|| repo.store(payload))?;
//! ```

mod error;
mod failure;
mod guard;
mod manager;
mod nesting;

pub use error::{TransactionError, TransactionResult};
pub use failure::FailureReport;
pub use manager::{ScopeRecord, TransactionManager};
pub use nesting::NestingMode;
