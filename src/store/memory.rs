//! In-memory journaling store.
//!
//! `MemoryStore` does not hold data. It records every command it accepts so
//! callers can assert on the exact sequence a transaction manager issued, and
//! it can be told to reject the next command of a given kind.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use crate::store::error::{StoreError, StoreResult};
use crate::store::TransactionStore;

/// A command accepted by a [`MemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "command", content = "savepoint", rename_all = "snake_case")]
pub enum StoreCall {
    Begin,
    Commit,
    Rollback,
    Savepoint(String),
    ReleaseSavepoint(String),
    RollbackToSavepoint(String),
}

impl StoreCall {
    fn kind(&self) -> CallKind {
        match self {
            StoreCall::Begin => CallKind::Begin,
            StoreCall::Commit => CallKind::Commit,
            StoreCall::Rollback => CallKind::Rollback,
            StoreCall::Savepoint(_) => CallKind::Savepoint,
            StoreCall::ReleaseSavepoint(_) => CallKind::ReleaseSavepoint,
            StoreCall::RollbackToSavepoint(_) => CallKind::RollbackToSavepoint,
        }
    }

    /// Whether this call closes a scope by discarding its work.
    pub fn is_rollback(&self) -> bool {
        matches!(self, StoreCall::Rollback | StoreCall::RollbackToSavepoint(_))
    }
}

impl fmt::Display for StoreCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreCall::Begin => write!(f, "BEGIN"),
            StoreCall::Commit => write!(f, "COMMIT"),
            StoreCall::Rollback => write!(f, "ROLLBACK"),
            StoreCall::Savepoint(name) => write!(f, "SAVEPOINT {name}"),
            StoreCall::ReleaseSavepoint(name) => write!(f, "RELEASE SAVEPOINT {name}"),
            StoreCall::RollbackToSavepoint(name) => write!(f, "ROLLBACK TO SAVEPOINT {name}"),
        }
    }
}

/// Command kinds, used for failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CallKind {
    Begin,
    Commit,
    Rollback,
    Savepoint,
    ReleaseSavepoint,
    RollbackToSavepoint,
}

#[derive(Debug, Default)]
struct MemoryState {
    journal: Vec<StoreCall>,
    /// Open top-level transactions (more than one only for nested begins).
    open: usize,
    /// Savepoint names, innermost last.
    savepoints: Vec<String>,
    pending_failures: Vec<CallKind>,
    rejected: usize,
}

/// Journaling in-memory store.
///
/// Cloning is cheap and every clone shares the same journal, so a test can
/// hand one clone to a transaction manager and inspect the other.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    savepoints: bool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create a store with savepoint support.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState::default())),
            savepoints: true,
        }
    }

    /// Create a store that only understands top-level transactions.
    pub fn without_savepoints() -> Self {
        Self {
            savepoints: false,
            ..Self::new()
        }
    }

    /// Snapshot of every accepted command, oldest first.
    pub fn journal(&self) -> Vec<StoreCall> {
        self.state.lock().journal.clone()
    }

    /// Number of accepted commands equal to `call`.
    pub fn count(&self, call: &StoreCall) -> usize {
        self.state.lock().journal.iter().filter(|c| *c == call).count()
    }

    /// Number of top-level transactions currently open.
    pub fn open_transactions(&self) -> usize {
        self.state.lock().open
    }

    /// Number of commands rejected through failure injection.
    pub fn rejected(&self) -> usize {
        self.state.lock().rejected
    }

    /// Reject the next `BEGIN`.
    pub fn fail_next_begin(&self) {
        self.state.lock().pending_failures.push(CallKind::Begin);
    }

    /// Reject the next `COMMIT`.
    pub fn fail_next_commit(&self) {
        self.state.lock().pending_failures.push(CallKind::Commit);
    }

    /// Reject the next `ROLLBACK`.
    pub fn fail_next_rollback(&self) {
        self.state.lock().pending_failures.push(CallKind::Rollback);
    }

    /// Reject the next `SAVEPOINT`.
    pub fn fail_next_savepoint(&self) {
        self.state.lock().pending_failures.push(CallKind::Savepoint);
    }

    fn accept(&self, call: StoreCall) -> StoreResult<()> {
        let mut state = self.state.lock();
        let kind = call.kind();

        if let Some(pos) = state.pending_failures.iter().position(|k| *k == kind) {
            state.pending_failures.remove(pos);
            state.rejected += 1;
            return Err(match call {
                StoreCall::Begin => StoreError::BeginRejected("injected failure".into()),
                StoreCall::Commit => StoreError::CommitRejected("injected failure".into()),
                StoreCall::Rollback => StoreError::RollbackRejected("injected failure".into()),
                StoreCall::Savepoint(name)
                | StoreCall::ReleaseSavepoint(name)
                | StoreCall::RollbackToSavepoint(name) => StoreError::Savepoint {
                    name,
                    reason: "injected failure".into(),
                },
            });
        }

        match &call {
            StoreCall::Begin => state.open += 1,
            StoreCall::Commit | StoreCall::Rollback => {
                if state.open == 0 {
                    return Err(StoreError::NoTransaction);
                }
                state.open -= 1;
                if state.open == 0 {
                    state.savepoints.clear();
                }
            }
            StoreCall::Savepoint(name) => {
                if state.open == 0 {
                    return Err(StoreError::NoTransaction);
                }
                state.savepoints.push(name.clone());
            }
            StoreCall::ReleaseSavepoint(name) | StoreCall::RollbackToSavepoint(name) => {
                let Some(pos) = state.savepoints.iter().rposition(|s| s == name) else {
                    return Err(StoreError::Savepoint {
                        name: name.clone(),
                        reason: "no such savepoint".into(),
                    });
                };
                state.savepoints.truncate(pos);
            }
        }

        state.journal.push(call);
        Ok(())
    }
}

impl TransactionStore for MemoryStore {
    fn begin(&mut self) -> StoreResult<()> {
        self.accept(StoreCall::Begin)
    }

    fn commit(&mut self) -> StoreResult<()> {
        self.accept(StoreCall::Commit)
    }

    fn rollback(&mut self) -> StoreResult<()> {
        self.accept(StoreCall::Rollback)
    }

    fn supports_savepoints(&self) -> bool {
        self.savepoints
    }

    fn savepoint(&mut self, name: &str) -> StoreResult<()> {
        if !self.savepoints {
            return Err(StoreError::Unsupported(format!("SAVEPOINT {name}")));
        }
        self.accept(StoreCall::Savepoint(name.to_string()))
    }

    fn release_savepoint(&mut self, name: &str) -> StoreResult<()> {
        if !self.savepoints {
            return Err(StoreError::Unsupported(format!("RELEASE SAVEPOINT {name}")));
        }
        self.accept(StoreCall::ReleaseSavepoint(name.to_string()))
    }

    fn rollback_to_savepoint(&mut self, name: &str) -> StoreResult<()> {
        if !self.savepoints {
            return Err(StoreError::Unsupported(format!("ROLLBACK TO SAVEPOINT {name}")));
        }
        self.accept(StoreCall::RollbackToSavepoint(name.to_string()))
    }
}
