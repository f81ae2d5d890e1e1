//! Repository error taxonomy.
//!
//! # Invariants
//! - Every repository/consistency failure maps to exactly one [`ErrorKind`].
//! - Reads that match nothing are not errors; `NotFound` is only produced by
//!   operations that require an existing row.

use crate::db::DbError;
use crate::model::{Entity, ValidationError};
use rusqlite::{ffi, ErrorCode};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Coarse failure class for outer layers mapping to transport statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Statement preparation/execution failed; the process may continue.
    Query,
    /// Uniqueness/check violation or invalid input; client-correctable.
    Constraint,
    /// A referenced entity does not exist.
    NotFound,
}

/// Uniqueness or check-constraint violation.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstraintViolation {
    /// Primary key already exists.
    DuplicateKey { entity: Entity, key: String },
    /// A `CHECK` constraint rejected the row, e.g. negative student credits.
    Check { entity: Entity, message: String },
    /// Any other engine constraint (`NOT NULL`, foreign key).
    Other { entity: Entity, message: String },
}

impl Display for ConstraintViolation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateKey { entity, key } => write!(f, "{entity} `{key}` already exists"),
            Self::Check { entity, message } => {
                write!(f, "{entity} check constraint failed: {message}")
            }
            Self::Other { entity, message } => {
                write!(f, "{entity} constraint failed: {message}")
            }
        }
    }
}

/// Error for repository and consistency operations.
#[derive(Debug)]
pub enum RepoError {
    Query(DbError),
    Constraint(ConstraintViolation),
    Validation(ValidationError),
    NotFound { entity: Entity, id: String },
    InvalidData(String),
}

impl RepoError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Query(_) | Self::InvalidData(_) => ErrorKind::Query,
            Self::Constraint(_) | Self::Validation(_) => ErrorKind::Constraint,
            Self::NotFound { .. } => ErrorKind::NotFound,
        }
    }

    pub(crate) fn not_found(entity: Entity, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Returns whether the engine gave up waiting for a lock.
    ///
    /// Callers may retry these operations.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            Self::Query(DbError::Sqlite(rusqlite::Error::SqliteFailure(failure, _)))
                if matches!(failure.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
        )
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Query(err) => write!(f, "{err}"),
            Self::Constraint(violation) => write!(f, "{violation}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Query(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::Constraint(_) => None,
            Self::NotFound { .. } => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Query(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Query(DbError::Sqlite(value))
    }
}

/// Classifies a failed write against `entity` keyed by `key`.
pub(crate) fn classify_write_error(err: rusqlite::Error, entity: Entity, key: &str) -> RepoError {
    let extended_code = match &err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == ErrorCode::ConstraintViolation =>
        {
            Some(failure.extended_code)
        }
        _ => None,
    };
    let Some(extended_code) = extended_code else {
        return RepoError::from(err);
    };

    let violation = match extended_code {
        ffi::SQLITE_CONSTRAINT_PRIMARYKEY | ffi::SQLITE_CONSTRAINT_UNIQUE => {
            ConstraintViolation::DuplicateKey {
                entity,
                key: key.to_string(),
            }
        }
        ffi::SQLITE_CONSTRAINT_CHECK => ConstraintViolation::Check {
            entity,
            message: err.to_string(),
        },
        _ => ConstraintViolation::Other {
            entity,
            message: err.to_string(),
        },
    };
    RepoError::Constraint(violation)
}
