//! Domain model for courses, students and enrollments.
//!
//! # Responsibility
//! - Define the row-shaped records persisted by the core.
//! - Validate caller-supplied records before any SQL runs.
//!
//! # Invariants
//! - Primary keys are caller-supplied and never generated by the core.
//! - `Student::credits` is never negative.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod course;
pub mod enrollment;
pub mod student;

/// Persisted entity kinds, named after their tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    Course,
    Student,
    Enrollment,
}

impl Entity {
    /// Table name backing this entity.
    pub const fn table(self) -> &'static str {
        match self {
            Self::Course => "course",
            Self::Student => "student",
            Self::Enrollment => "enrollment",
        }
    }
}

impl Display for Entity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table())
    }
}

/// Record-level validation failure, detected before touching storage.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A required text field is empty.
    MissingField {
        entity: Entity,
        field: &'static str,
    },
    /// A numeric field is NaN or infinite.
    NonFinite {
        entity: Entity,
        field: &'static str,
    },
    /// Student credits below zero.
    NegativeCredits { student_id: String, credits: f64 },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField { entity, field } => {
                write!(f, "{entity}.{field} is required")
            }
            Self::NonFinite { entity, field } => {
                write!(f, "{entity}.{field} must be a finite number")
            }
            Self::NegativeCredits {
                student_id,
                credits,
            } => write!(
                f,
                "student `{student_id}` credits must be >= 0, got {credits}"
            ),
        }
    }
}

impl Error for ValidationError {}

pub(crate) fn require_text(
    value: &str,
    entity: Entity,
    field: &'static str,
) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField { entity, field });
    }
    Ok(())
}

pub(crate) fn require_finite(
    value: f64,
    entity: Entity,
    field: &'static str,
) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFinite { entity, field });
    }
    Ok(())
}
