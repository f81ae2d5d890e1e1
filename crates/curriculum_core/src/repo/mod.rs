//! Repository layer: one repository per entity over the store connection.
//!
//! # Responsibility
//! - Compose [`QueryBuilder`](crate::query::QueryBuilder) output with typed
//!   row decoding.
//! - Stream decoded rows into caller-supplied visitors.
//! - Route multi-table mutations through the consistency engine.
//!
//! # Invariants
//! - Repository writes call `validate()` before any SQL runs.
//! - Reads never buffer the result set; each row is handed to the visitor as
//!   soon as it is decoded.
//! - Reads that match nothing succeed without invoking the visitor.

use crate::model::Entity;
use crate::query::BuiltQuery;
use log::{error, warn};
use rusqlite::{params_from_iter, Connection, Params, Row};

pub mod course_repo;
pub mod enrollment_repo;
pub mod error;
pub mod student_repo;

pub use error::{ConstraintViolation, ErrorKind, RepoError, RepoResult};

/// Runs `query` and hands every decoded row to `visitor`.
pub(crate) fn stream_rows<T>(
    conn: &Connection,
    entity: Entity,
    op: &'static str,
    query: &BuiltQuery,
    decode: fn(&Row<'_>) -> RepoResult<T>,
    visitor: &mut dyn FnMut(T),
) -> RepoResult<()> {
    let result = visit_rows(conn, query, decode, visitor);

    if let Err(err) = &result {
        error!(
            "event=repo_query module=repo status=error entity={} op={} error={}",
            entity, op, err
        );
    }
    result
}

fn visit_rows<T>(
    conn: &Connection,
    query: &BuiltQuery,
    decode: fn(&Row<'_>) -> RepoResult<T>,
    visitor: &mut dyn FnMut(T),
) -> RepoResult<()> {
    let mut stmt = conn.prepare(&query.sql)?;
    let mut rows = stmt.query(params_from_iter(query.params.iter()))?;
    while let Some(row) = rows.next()? {
        visitor(decode(row)?);
    }
    Ok(())
}

/// Executes one write statement and classifies constraint failures.
pub(crate) fn execute_write<P: Params>(
    conn: &Connection,
    entity: Entity,
    op: &'static str,
    key: &str,
    sql: &str,
    params: P,
) -> RepoResult<usize> {
    conn.execute(sql, params).map_err(|err| {
        let err = error::classify_write_error(err, entity, key);
        log_write_failure(entity, op, &err);
        err
    })
}

pub(crate) fn log_write_failure(entity: Entity, op: &'static str, err: &RepoError) {
    match err.kind() {
        ErrorKind::Query => error!(
            "event=repo_write module=repo status=error entity={} op={} error={}",
            entity, op, err
        ),
        ErrorKind::Constraint | ErrorKind::NotFound => warn!(
            "event=repo_write module=repo status=rejected entity={} op={} error={}",
            entity, op, err
        ),
    }
}
