//! Connection bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections.
//! - Configure connection pragmas required by core behavior.
//! - Recreate a backing file the engine cannot read, once.
//! - Trigger schema migrations before returning a usable connection.
//!
//! # Invariants
//! - Returned connections have the configured busy timeout and journal mode.
//! - Returned connections have migrations fully applied.
//! - Only "not a database" / "corrupt" failures trigger recreation; a newer
//!   schema version or an unopenable path is reported, never deleted.

use super::config::StoreConfig;
use super::migrations::apply_migrations;
use super::{DbError, DbResult, StoreInitError};
use log::{error, info, warn};
use rusqlite::{Connection, ErrorCode};
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Opens (or recreates) the configured database file and applies migrations.
///
/// # Side effects
/// - May delete the backing file and its `-wal`/`-shm` side files when the
///   engine reports them unreadable.
/// - Emits `db_open` / `db_recreate` logging events with duration and status.
pub(crate) fn open_file(config: &StoreConfig) -> Result<Connection, StoreInitError> {
    let started_at = Instant::now();
    info!(
        "event=db_open module=db status=start mode=file path={}",
        config.path.display()
    );

    let first_error = match open_and_bootstrap(config) {
        Ok(conn) => {
            info!(
                "event=db_open module=db status=ok mode=file duration_ms={}",
                started_at.elapsed().as_millis()
            );
            return Ok(conn);
        }
        Err(err) => err,
    };

    if !is_unreadable_database(&first_error) {
        error!(
            "event=db_open module=db status=error mode=file duration_ms={} error_code=db_bootstrap_failed error={}",
            started_at.elapsed().as_millis(),
            first_error
        );
        return Err(StoreInitError::new(Some(config.path.clone()), first_error));
    }

    warn!(
        "event=db_recreate module=db status=start path={} error={}",
        config.path.display(),
        first_error
    );
    remove_database_files(&config.path);

    match open_and_bootstrap(config) {
        Ok(conn) => {
            info!(
                "event=db_recreate module=db status=ok duration_ms={}",
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_recreate module=db status=error duration_ms={} error_code=db_recreate_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            Err(StoreInitError::new(Some(config.path.clone()), err))
        }
    }
}

/// Opens an in-memory SQLite database and applies all pending migrations.
pub(crate) fn open_memory(config: &StoreConfig) -> Result<Connection, StoreInitError> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode=memory");

    match open_memory_and_bootstrap(config) {
        Ok(conn) => {
            info!(
                "event=db_open module=db status=ok mode=memory duration_ms={}",
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode=memory duration_ms={} error_code=db_bootstrap_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            Err(StoreInitError::new(None, err))
        }
    }
}

fn open_and_bootstrap(config: &StoreConfig) -> DbResult<Connection> {
    let mut conn = Connection::open(&config.path)?;
    bootstrap_connection(&conn, config)?;
    apply_migrations(&mut conn)?;
    Ok(conn)
}

fn open_memory_and_bootstrap(config: &StoreConfig) -> DbResult<Connection> {
    let mut conn = Connection::open_in_memory()?;
    bootstrap_connection(&conn, config)?;
    apply_migrations(&mut conn)?;
    Ok(conn)
}

fn bootstrap_connection(conn: &Connection, config: &StoreConfig) -> DbResult<()> {
    conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
    // In-memory databases answer `memory` regardless of the requested mode.
    let journal_mode: String = conn.pragma_update_and_check(
        None,
        "journal_mode",
        config.journal_mode.pragma_value(),
        |row| row.get(0),
    )?;
    if config.foreign_keys {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    }
    info!(
        "event=db_configure module=db status=ok journal_mode={} busy_timeout_ms={} foreign_keys={}",
        journal_mode, config.busy_timeout_ms, config.foreign_keys
    );
    Ok(())
}

fn is_unreadable_database(err: &DbError) -> bool {
    match err {
        DbError::Sqlite(rusqlite::Error::SqliteFailure(failure, _)) => matches!(
            failure.code,
            ErrorCode::NotADatabase | ErrorCode::DatabaseCorrupt
        ),
        _ => false,
    }
}

fn remove_database_files(path: &Path) {
    for candidate in [
        path.to_path_buf(),
        side_file(path, "-wal"),
        side_file(path, "-shm"),
    ] {
        match std::fs::remove_file(&candidate) {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => warn!(
                "event=db_recreate module=db status=error path={} error_code=remove_failed error={}",
                candidate.display(),
                err
            ),
        }
    }
}

fn side_file(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}
