//! Explicit owner of the single SQLite connection.
//!
//! # Responsibility
//! - Hold the connection between `open` and `close`.
//! - Hand out repositories and the consistency engine that borrow it.
//!
//! # Invariants
//! - There is no process-wide handle; every `Store` is independent, so tests
//!   and request workers can open as many as they need.
//! - `close` is idempotent and never panics.

use super::config::StoreConfig;
use super::open::{open_file, open_memory};
use super::{DbError, DbResult, StoreInitError};
use crate::repo::course_repo::SqliteCourseRepository;
use crate::repo::enrollment_repo::SqliteEnrollmentRepository;
use crate::repo::student_repo::SqliteStudentRepository;
use crate::service::consistency::ConsistencyEngine;
use log::{info, warn};
use rusqlite::Connection;
use std::path::{Path, PathBuf};

/// Owned SQLite store for curriculum data.
#[derive(Debug)]
pub struct Store {
    conn: Option<Connection>,
    path: Option<PathBuf>,
}

impl Store {
    /// Opens the configured file, recreating it if the engine cannot read it.
    ///
    /// # Errors
    /// - [`StoreInitError`] when even a fresh file cannot be opened or the
    ///   schema cannot be created. The caller must treat this as fatal.
    pub fn open(config: &StoreConfig) -> Result<Self, StoreInitError> {
        let conn = open_file(config)?;
        Ok(Self {
            conn: Some(conn),
            path: Some(config.path.clone()),
        })
    }

    /// Opens a private in-memory store with the default settings.
    pub fn open_in_memory() -> Result<Self, StoreInitError> {
        let conn = open_memory(&StoreConfig::default())?;
        Ok(Self {
            conn: Some(conn),
            path: None,
        })
    }

    /// Backing file path, `None` for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    /// Borrows the live connection.
    ///
    /// # Errors
    /// - [`DbError::Closed`] after [`Store::close`].
    pub fn connection(&self) -> DbResult<&Connection> {
        self.conn.as_ref().ok_or(DbError::Closed)
    }

    /// Releases the connection. Safe to call any number of times.
    pub fn close(&mut self) {
        let Some(conn) = self.conn.take() else {
            return;
        };

        match conn.close() {
            Ok(()) => info!("event=db_close module=db status=ok"),
            Err((_conn, err)) => warn!(
                "event=db_close module=db status=error error_code=db_close_failed error={}",
                err
            ),
        }
    }

    /// Course repository borrowing this store's connection.
    pub fn courses(&self) -> DbResult<SqliteCourseRepository<'_>> {
        Ok(SqliteCourseRepository::new(self.connection()?))
    }

    /// Student repository borrowing this store's connection.
    pub fn students(&self) -> DbResult<SqliteStudentRepository<'_>> {
        Ok(SqliteStudentRepository::new(self.connection()?))
    }

    /// Enrollment repository borrowing this store's connection.
    pub fn enrollments(&self) -> DbResult<SqliteEnrollmentRepository<'_>> {
        Ok(SqliteEnrollmentRepository::new(self.connection()?))
    }

    /// Cross-entity rules engine borrowing this store's connection.
    pub fn consistency(&self) -> DbResult<ConsistencyEngine<'_>> {
        Ok(ConsistencyEngine::new(self.connection()?))
    }
}

#[cfg(test)]
mod tests {
    use super::Store;
    use crate::db::DbError;

    #[test]
    fn close_is_idempotent_and_blocks_further_access() {
        let mut store = Store::open_in_memory().expect("in-memory store should open");
        assert!(store.is_open());

        store.close();
        store.close();

        assert!(!store.is_open());
        assert!(matches!(store.connection(), Err(DbError::Closed)));
        assert!(matches!(store.courses(), Err(DbError::Closed)));
    }
}
