//! Enrollment join record.

use super::{require_text, Entity, ValidationError};
use serde::{Deserialize, Serialize};

/// Links one student to one course. Both ids form the primary key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Enrollment {
    pub student_id: String,
    pub course_id: String,
}

impl Enrollment {
    pub fn new(student_id: impl Into<String>, course_id: impl Into<String>) -> Self {
        Self {
            student_id: student_id.into(),
            course_id: course_id.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text(&self.student_id, Entity::Enrollment, "student_id")?;
        require_text(&self.course_id, Entity::Enrollment, "course_id")?;
        Ok(())
    }
}
