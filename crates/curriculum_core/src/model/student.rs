//! Student record.
//!
//! # Invariants
//! - `student_id` and `name` are non-empty.
//! - `credits` is finite and `>= 0`; the column carries the same CHECK.
//! - `credits` is derived from enrollments but may be overwritten directly
//!   for administrative correction.

use super::{require_finite, require_text, Entity, ValidationError};
use serde::{Deserialize, Serialize};

/// One student row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub student_id: String,
    pub name: String,
    pub email: Option<String>,
    /// Running total of enrolled course credit.
    #[serde(default)]
    pub credits: f64,
}

impl Student {
    /// Creates a student with no email and zero credits.
    pub fn new(student_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            student_id: student_id.into(),
            name: name.into(),
            email: None,
            credits: 0.0,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_credits(mut self, credits: f64) -> Self {
        self.credits = credits;
        self
    }

    /// Checks the record before it is written.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text(&self.student_id, Entity::Student, "student_id")?;
        require_text(&self.name, Entity::Student, "name")?;
        require_finite(self.credits, Entity::Student, "credits")?;
        if self.credits < 0.0 {
            return Err(ValidationError::NegativeCredits {
                student_id: self.student_id.clone(),
                credits: self.credits,
            });
        }
        Ok(())
    }
}
