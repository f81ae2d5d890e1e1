//! SQLite storage bootstrap, schema migration and store lifecycle.
//!
//! # Responsibility
//! - Open and configure the single SQLite connection owned by a [`Store`].
//! - Apply schema migrations in deterministic order.
//! - Recreate a backing file that the engine reports as unreadable.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Core code must not read/write application data before migrations succeed.
//! - Repositories only borrow the connection; the store owns it.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

mod config;
pub mod migrations;
mod open;
mod store;

pub use config::{JournalMode, StoreConfig, DEFAULT_BUSY_TIMEOUT_MS, DEFAULT_DB_FILE};
pub use store::Store;

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// The owning store was closed before the operation ran.
    Closed,
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::Closed => write!(f, "store is closed"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
            Self::Closed => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Fatal failure to open a store or create its schema.
///
/// Callers must not continue serving requests after receiving this error.
#[derive(Debug)]
pub struct StoreInitError {
    /// Backing file, `None` for in-memory stores.
    pub path: Option<PathBuf>,
    pub source: DbError,
}

impl StoreInitError {
    pub(crate) fn new(path: Option<PathBuf>, source: DbError) -> Self {
        Self { path, source }
    }
}

impl Display for StoreInitError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.path {
            Some(path) => write!(
                f,
                "failed to initialize store at `{}`: {}",
                path.display(),
                self.source
            ),
            None => write!(f, "failed to initialize in-memory store: {}", self.source),
        }
    }
}

impl Error for StoreInitError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}
