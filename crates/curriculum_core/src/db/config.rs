//! Store configuration.
//!
//! # Invariants
//! - `busy_timeout_ms` is the only concurrency guard; writers that wait longer
//!   receive the engine's busy error.
//! - `JournalMode` values map 1:1 to SQLite `journal_mode` pragma settings.

use serde::Deserialize;
use std::path::PathBuf;

/// Default backing file name, relative to the working directory.
pub const DEFAULT_DB_FILE: &str = "curriculum.db";
/// Default bounded lock wait in milliseconds.
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// SQLite journal (durability) mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JournalMode {
    /// Write-ahead log.
    #[default]
    Wal,
    /// Rollback journal deleted after each transaction.
    Delete,
}

impl JournalMode {
    /// Returns the SQLite pragma value.
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// Configuration for opening a file-backed [`Store`](super::Store).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoreConfig {
    /// Path to the SQLite database file.
    pub path: PathBuf,
    /// Lock wait in milliseconds before the engine reports busy.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    #[serde(default)]
    pub journal_mode: JournalMode,
    /// Enables engine-level foreign keys in addition to the application cascades.
    #[serde(default = "default_foreign_keys")]
    pub foreign_keys: bool,
}

impl StoreConfig {
    /// Builds a config for `path` with every other setting at its default.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_DB_FILE),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: JournalMode::default(),
            foreign_keys: default_foreign_keys(),
        }
    }
}

const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

const fn default_foreign_keys() -> bool {
    true
}
