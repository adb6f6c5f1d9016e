//! Transaction manager - coordinates all transaction operations.
//!
//! The TransactionManager is the main entry point for transactions.
//! It handles:
//! - Opening and closing nested scopes against one store
//! - Mapping inner scopes onto savepoints (see [`NestingMode`])
//! - Rolling back every open scope when a request fails
//!
//! A manager is request-scoped: build one per inbound request and drop it when
//! the request ends. Dropping the last handle while scopes are still open
//! rolls them all back.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::{debug, error, warn};
use ulid::Ulid;

use crate::config::Config;
use crate::store::TransactionStore;
use crate::transaction::error::{TransactionError, TransactionResult};
use crate::transaction::failure::FailureReport;
use crate::transaction::guard::ScopeGuard;
use crate::transaction::nesting::NestingMode;

/// One open scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeRecord {
    /// 1 for the outermost scope.
    pub depth: usize,
    /// Savepoint backing this scope, if any.
    pub savepoint: Option<String>,
    /// When the scope was opened.
    pub opened_at: DateTime<Utc>,
}

/// Transaction manager - coordinates all transaction operations.
///
/// Thread-safe: can be shared via Clone (uses Arc internally). All clones
/// observe the same nesting depth.
pub struct TransactionManager<S: TransactionStore> {
    inner: Arc<ManagerInner<S>>,
}

impl<S: TransactionStore> Clone for TransactionManager<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct ManagerInner<S: TransactionStore> {
    /// Identifies the request scope in log output.
    id: Ulid,
    /// Strategy for inner scopes, already resolved against the store.
    nesting: NestingMode,
    state: Mutex<ManagerState<S>>,
}

struct ManagerState<S> {
    store: S,
    /// Open scopes, innermost last. Its length is the active count.
    scopes: Vec<ScopeRecord>,
    /// Armed lazily on the first begin, never disarmed.
    hook_registered: bool,
    /// Set by an inner rollback under flat nesting.
    rollback_only: bool,
}

impl<S: TransactionStore> ManagerState<S> {
    fn active(&self) -> usize {
        self.scopes.len()
    }

    fn begin(&mut self, nesting: NestingMode) -> TransactionResult<ScopeRecord> {
        let depth = self.active() + 1;

        let savepoint = match nesting {
            _ if depth == 1 => {
                self.store.begin()?;
                None
            }
            NestingMode::Passthrough => {
                self.store.begin()?;
                None
            }
            NestingMode::Savepoints => {
                let name = format!("sp_{depth}");
                self.store.savepoint(&name)?;
                Some(name)
            }
            NestingMode::Flat => None,
        };

        // Only count the scope once the store has accepted it.
        let scope = ScopeRecord {
            depth,
            savepoint,
            opened_at: Utc::now(),
        };
        self.scopes.push(scope.clone());
        Ok(scope)
    }

    fn commit(&mut self, nesting: NestingMode) -> TransactionResult<()> {
        let Some(scope) = self.scopes.last() else {
            return Ok(());
        };

        if scope.depth == 1 && self.rollback_only {
            let result = self.store.rollback();
            self.close();
            result?;
            return Err(TransactionError::RollbackOnly);
        }

        match (&scope.savepoint, nesting) {
            (Some(name), _) => {
                let name = name.clone();
                self.store.release_savepoint(&name)?;
            }
            (None, NestingMode::Flat) if scope.depth > 1 => {}
            (None, _) => self.store.commit()?,
        }

        self.close();
        Ok(())
    }

    fn rollback(&mut self, nesting: NestingMode) -> TransactionResult<()> {
        let Some(scope) = self.scopes.last() else {
            return Ok(());
        };

        let result = match (&scope.savepoint, nesting) {
            (Some(name), _) => {
                let name = name.clone();
                self.store.rollback_to_savepoint(&name)
            }
            (None, NestingMode::Flat) if scope.depth > 1 => {
                self.rollback_only = true;
                Ok(())
            }
            (None, _) => self.store.rollback(),
        };

        // A scope whose rollback failed is still considered closed; the
        // store's own recovery owns whatever it left behind.
        self.close();
        result.map_err(TransactionError::from)
    }

    fn rollback_all(&mut self, nesting: NestingMode, id: Ulid) -> usize {
        let mut closed = 0;
        while self.active() > 0 {
            let depth = self.active();
            if let Err(e) = self.rollback(nesting) {
                warn!(manager = %id, depth, error = %e, "rollback failed during rollback-all");
            }
            closed += 1;
        }
        closed
    }

    fn close(&mut self) {
        self.scopes.pop();
        if self.scopes.is_empty() {
            self.rollback_only = false;
        }
    }
}

impl<S: TransactionStore> TransactionManager<S> {
    /// Create a new transaction manager with the default nesting mode.
    pub fn new(store: S) -> Self {
        Self::with_nesting(store, NestingMode::default())
    }

    /// Create a new transaction manager using the nesting mode from `config`.
    pub fn from_config(store: S, config: &Config) -> Self {
        Self::with_nesting(store, config.nesting)
    }

    /// Create a new transaction manager with a specific nesting mode.
    ///
    /// Savepoint nesting against a store without savepoints degrades to
    /// [`NestingMode::Flat`].
    pub fn with_nesting(store: S, nesting: NestingMode) -> Self {
        let id = Ulid::new();
        let effective = nesting.effective(store.supports_savepoints());
        if effective != nesting {
            warn!(
                manager = %id,
                requested = %nesting,
                effective = %effective,
                "store has no savepoint support; nested scopes are counted only"
            );
        }

        Self {
            inner: Arc::new(ManagerInner {
                id,
                nesting: effective,
                state: Mutex::new(ManagerState {
                    store,
                    scopes: Vec::new(),
                    hook_registered: false,
                    rollback_only: false,
                }),
            }),
        }
    }

    /// Identifier of this request scope.
    pub fn id(&self) -> Ulid {
        self.inner.id
    }

    /// Nesting mode in effect.
    pub fn nesting(&self) -> NestingMode {
        self.inner.nesting
    }

    /// Get the number of open scopes.
    pub fn active_count(&self) -> usize {
        self.inner.state.lock().active()
    }

    /// Check if any scope is open.
    pub fn is_active(&self) -> bool {
        self.active_count() > 0
    }

    /// Check if the failure hook has been armed.
    pub fn hook_registered(&self) -> bool {
        self.inner.state.lock().hook_registered
    }

    /// Check if an inner scope has doomed the current transaction.
    pub fn is_rollback_only(&self) -> bool {
        self.inner.state.lock().rollback_only
    }

    /// List the open scopes, outermost first.
    pub fn scopes(&self) -> Vec<ScopeRecord> {
        self.inner.state.lock().scopes.clone()
    }

    /// Open a new scope.
    ///
    /// The first scope of a manager arms the failure hook. The active count
    /// only moves once the store has accepted the command, so a rejected
    /// begin leaves the manager exactly as it was.
    pub fn begin_transaction(&self) -> TransactionResult<()> {
        let mut state = self.inner.state.lock();

        if state.active() == 0 && !state.hook_registered {
            state.hook_registered = true;
            debug!(manager = %self.inner.id, "failure hook armed");
        }

        let scope = state.begin(self.inner.nesting)?;
        debug!(
            manager = %self.inner.id,
            depth = scope.depth,
            savepoint = scope.savepoint.as_deref(),
            "transaction scope opened"
        );
        Ok(())
    }

    /// Commit the innermost scope. A no-op when nothing is open.
    ///
    /// If the store rejects the commit the scope stays open so that it can
    /// still be rolled back.
    pub fn commit(&self) -> TransactionResult<()> {
        let mut state = self.inner.state.lock();
        let depth = state.active();
        if depth == 0 {
            return Ok(());
        }

        state.commit(self.inner.nesting)?;
        debug!(manager = %self.inner.id, depth, "transaction scope committed");
        Ok(())
    }

    /// Roll back the innermost scope. A no-op when nothing is open.
    pub fn rollback(&self) -> TransactionResult<()> {
        let mut state = self.inner.state.lock();
        let depth = state.active();
        if depth == 0 {
            return Ok(());
        }

        state.rollback(self.inner.nesting)?;
        debug!(manager = %self.inner.id, depth, "transaction scope rolled back");
        Ok(())
    }

    /// Roll back every open scope, innermost first. Returns how many were closed.
    pub fn rollback_all(&self) -> usize {
        self.inner
            .state
            .lock()
            .rollback_all(self.inner.nesting, self.inner.id)
    }

    /// Execute a function within a scope, automatically committing or rolling back.
    ///
    /// If the function returns Ok, the scope is committed.
    /// If the function returns Err, the scope is rolled back and the error is
    /// returned unchanged. If it panics, the scope is rolled back while the
    /// panic unwinds.
    pub fn transaction<F, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: From<TransactionError>,
    {
        self.begin_transaction()?;
        let guard = ScopeGuard::new(self, self.active_count());

        match f() {
            Ok(value) => {
                guard.commit()?;
                Ok(value)
            }
            Err(e) => {
                guard.rollback();
                Err(e)
            }
        }
    }

    /// Failure hook for errors that reached the request boundary unhandled.
    ///
    /// Rolls back every open scope, then logs the failure once. Does nothing
    /// when no scope was ever opened on this manager. Returns how many scopes
    /// were rolled back.
    pub fn handle_failure(&self, report: &FailureReport) -> usize {
        let mut state = self.inner.state.lock();
        if !state.hook_registered {
            return 0;
        }

        let rolled_back = state.rollback_all(self.inner.nesting, self.inner.id);
        // The failure text is the event message.
        error!(
            manager = %self.inner.id,
            failure_kind = %report.kind,
            source_location = %report.location,
            rolled_back,
            message = %report.message
        );
        rolled_back
    }

    /// [`handle_failure`](Self::handle_failure) for an error value, recording
    /// the caller's location.
    #[track_caller]
    pub fn handle_uncaught<E>(&self, error: &E) -> usize
    where
        E: std::error::Error + ?Sized,
    {
        let report = FailureReport::capture(error);
        self.handle_failure(&report)
    }
}

impl<S: TransactionStore> Drop for ManagerInner<S> {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        if state.active() == 0 {
            return;
        }

        let open = state.active();
        let closed = state.rollback_all(self.nesting, self.id);
        if std::thread::panicking() {
            error!(
                manager = %self.id,
                open,
                closed,
                "request panicked with open transaction scopes"
            );
        } else {
            warn!(manager = %self.id, open, closed, "request ended with open transaction scopes");
        }
    }
}

impl<S: TransactionStore> std::fmt::Debug for TransactionManager<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionManager")
            .field("id", &self.inner.id)
            .field("nesting", &self.inner.nesting)
            .field("active_count", &self.active_count())
            .finish()
    }
}
