//! Course record.
//!
//! # Invariants
//! - `course_id` is non-empty.
//! - Hours and `credit` are finite; no other numeric rule is enforced.

use super::{require_finite, require_text, Entity, ValidationError};
use serde::{Deserialize, Serialize};

/// One course row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub course_id: String,
    pub name: Option<String>,
    /// Serialized as `type` to match the column name.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub total_hours: f64,
    #[serde(default)]
    pub lecture_hours: f64,
    #[serde(default)]
    pub lab_hours: f64,
    /// Credit granted to every enrolled student.
    pub credit: f64,
    pub semester: Option<String>,
}

impl Course {
    /// Creates a course with only the required fields set.
    pub fn new(course_id: impl Into<String>, credit: f64) -> Self {
        Self {
            course_id: course_id.into(),
            name: None,
            kind: None,
            total_hours: 0.0,
            lecture_hours: 0.0,
            lab_hours: 0.0,
            credit,
            semester: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn with_semester(mut self, semester: impl Into<String>) -> Self {
        self.semester = Some(semester.into());
        self
    }

    pub fn with_hours(mut self, total: f64, lecture: f64, lab: f64) -> Self {
        self.total_hours = total;
        self.lecture_hours = lecture;
        self.lab_hours = lab;
        self
    }

    /// Checks the record before it is written.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text(&self.course_id, Entity::Course, "course_id")?;
        require_finite(self.total_hours, Entity::Course, "total_hours")?;
        require_finite(self.lecture_hours, Entity::Course, "lecture_hours")?;
        require_finite(self.lab_hours, Entity::Course, "lab_hours")?;
        require_finite(self.credit, Entity::Course, "credit")?;
        Ok(())
    }
}
