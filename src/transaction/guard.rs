//! Drop guard for a single scope opened by [`TransactionManager::transaction`].
//!
//! The guard remembers the depth of the scope it owns. Whatever way the
//! wrapped closure exits (return, error, panic) the guard closes exactly that
//! scope, first rolling back anything the closure opened and forgot.

use tracing::warn;

use crate::store::TransactionStore;
use crate::transaction::error::TransactionResult;
use crate::transaction::manager::TransactionManager;

pub(crate) struct ScopeGuard<'a, S: TransactionStore> {
    manager: &'a TransactionManager<S>,
    depth: usize,
    armed: bool,
}

impl<'a, S: TransactionStore> ScopeGuard<'a, S> {
    pub(crate) fn new(manager: &'a TransactionManager<S>, depth: usize) -> Self {
        Self {
            manager,
            depth,
            armed: true,
        }
    }

    /// Commit the guarded scope. On failure the scope is rolled back before
    /// the error is returned.
    pub(crate) fn commit(mut self) -> TransactionResult<()> {
        self.armed = false;
        self.unwind_leaked();

        if self.manager.active_count() < self.depth {
            warn!(depth = self.depth, "guarded scope was closed by its own body");
            return Ok(());
        }

        if let Err(e) = self.manager.commit() {
            if self.manager.active_count() >= self.depth {
                self.rollback_own();
            }
            return Err(e);
        }
        Ok(())
    }

    /// Roll back the guarded scope. Store failures are logged, not returned,
    /// so the caller's original error wins.
    pub(crate) fn rollback(mut self) {
        self.armed = false;
        self.unwind_leaked();
        self.rollback_own();
    }

    fn unwind_leaked(&self) {
        while self.manager.active_count() > self.depth {
            warn!(
                depth = self.depth,
                open = self.manager.active_count(),
                "rolling back scope left open inside a transaction body"
            );
            if let Err(e) = self.manager.rollback() {
                warn!(error = %e, "rollback of leaked scope failed");
            }
        }
    }

    fn rollback_own(&self) {
        if self.manager.active_count() < self.depth {
            return;
        }
        if let Err(e) = self.manager.rollback() {
            warn!(depth = self.depth, error = %e, "rollback failed");
        }
    }
}

impl<S: TransactionStore> Drop for ScopeGuard<'_, S> {
    fn drop(&mut self) {
        if self.armed {
            self.unwind_leaked();
            self.rollback_own();
        }
    }
}
