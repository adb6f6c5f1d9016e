//! How nested transaction scopes map onto the store.
//!
//! txquery supports three strategies:
//! - Savepoints: the outermost scope is a real transaction, inner scopes are savepoints
//! - Flat: only the outermost scope touches the store, inner scopes are counted
//! - Passthrough: every scope issues its own begin/commit/rollback

use std::fmt;

use serde::{Deserialize, Serialize};

/// Nesting strategy for inner transaction scopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NestingMode {
    /// Inner scopes become `SAVEPOINT`s.
    ///
    /// A failing inner scope discards only its own work and the outer scope
    /// can still commit. Requires a store that implements savepoints; with
    /// any other store the manager falls back to [`NestingMode::Flat`].
    #[default]
    Savepoints,

    /// Inner scopes are counted, never sent to the store.
    ///
    /// Rolling back an inner scope marks the whole transaction rollback-only:
    /// the outermost commit then rolls back instead.
    Flat,

    /// Every scope sends its own command to the store.
    ///
    /// Only correct for stores with true nested transactions.
    Passthrough,
}

impl NestingMode {
    /// The mode actually usable against a store.
    pub fn effective(self, supports_savepoints: bool) -> NestingMode {
        match self {
            NestingMode::Savepoints if !supports_savepoints => NestingMode::Flat,
            mode => mode,
        }
    }
}

impl fmt::Display for NestingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NestingMode::Savepoints => write!(f, "savepoints"),
            NestingMode::Flat => write!(f, "flat"),
            NestingMode::Passthrough => write!(f, "passthrough"),
        }
    }
}

impl std::str::FromStr for NestingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "savepoints" | "savepoint" => Ok(NestingMode::Savepoints),
            "flat" | "counting" => Ok(NestingMode::Flat),
            "passthrough" | "nested" => Ok(NestingMode::Passthrough),
            _ => Err(format!("unknown nesting mode: {}", s)),
        }
    }
}
