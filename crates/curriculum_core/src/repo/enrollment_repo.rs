//! Enrollment repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide add/remove/list/find APIs over the `enrollment` join table.
//!
//! # Invariants
//! - Enrollments have no mutable fields, so there is no `update`.
//! - Every mutation goes through the consistency engine, which keeps
//!   `student.credits` in step with the enrolled course credit.

use crate::model::enrollment::Enrollment;
use crate::model::Entity;
use crate::query::{EnrollmentColumn, QueryBuilder, QueryOptions};
use crate::repo::{stream_rows, RepoResult};
use crate::service::consistency::ConsistencyEngine;
use rusqlite::types::Value;
use rusqlite::{Connection, Row};

const ENROLLMENT_SELECT_SQL: &str = "SELECT student_id, course_id FROM enrollment";

/// Repository interface for enrollment operations.
pub trait EnrollmentRepository {
    /// Enrolls a student and credits them with the course credit.
    fn add(&self, enrollment: &Enrollment) -> RepoResult<()>;
    /// Unenrolls a student and debits the course credit.
    fn remove(&self, student_id: &str, course_id: &str) -> RepoResult<()>;
    /// Removes every enrollment and resets every student's credits to zero.
    fn remove_all(&self) -> RepoResult<()>;
    fn list(
        &self,
        options: Option<&QueryOptions>,
        visitor: &mut dyn FnMut(Enrollment),
    ) -> RepoResult<()>;
    fn find_by_student_id(
        &self,
        student_id: &str,
        options: Option<&QueryOptions>,
        visitor: &mut dyn FnMut(Enrollment),
    ) -> RepoResult<()>;
    fn find_by_course_id(
        &self,
        course_id: &str,
        options: Option<&QueryOptions>,
        visitor: &mut dyn FnMut(Enrollment),
    ) -> RepoResult<()>;
}

/// SQLite-backed enrollment repository.
pub struct SqliteEnrollmentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEnrollmentRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn find_where(
        &self,
        op: &'static str,
        predicate: &str,
        value: &str,
        options: Option<&QueryOptions>,
        visitor: &mut dyn FnMut(Enrollment),
    ) -> RepoResult<()> {
        let query = QueryBuilder::<EnrollmentColumn>::new(format!(
            "{ENROLLMENT_SELECT_SQL} WHERE {predicate}"
        ))
        .bind(Value::Text(value.to_string()))
        .options(options)
        .build();
        stream_rows(self.conn, Entity::Enrollment, op, &query, parse_enrollment_row, visitor)
    }
}

impl EnrollmentRepository for SqliteEnrollmentRepository<'_> {
    fn add(&self, enrollment: &Enrollment) -> RepoResult<()> {
        ConsistencyEngine::new(self.conn).enroll(enrollment)
    }

    fn remove(&self, student_id: &str, course_id: &str) -> RepoResult<()> {
        ConsistencyEngine::new(self.conn).unenroll(student_id, course_id)
    }

    fn remove_all(&self) -> RepoResult<()> {
        ConsistencyEngine::new(self.conn).remove_all_enrollments()
    }

    fn list(
        &self,
        options: Option<&QueryOptions>,
        visitor: &mut dyn FnMut(Enrollment),
    ) -> RepoResult<()> {
        let query = QueryBuilder::<EnrollmentColumn>::new(ENROLLMENT_SELECT_SQL)
            .options(options)
            .build();
        stream_rows(
            self.conn,
            Entity::Enrollment,
            "list",
            &query,
            parse_enrollment_row,
            visitor,
        )
    }

    fn find_by_student_id(
        &self,
        student_id: &str,
        options: Option<&QueryOptions>,
        visitor: &mut dyn FnMut(Enrollment),
    ) -> RepoResult<()> {
        self.find_where("find_by_student_id", "student_id = ?", student_id, options, visitor)
    }

    fn find_by_course_id(
        &self,
        course_id: &str,
        options: Option<&QueryOptions>,
        visitor: &mut dyn FnMut(Enrollment),
    ) -> RepoResult<()> {
        self.find_where("find_by_course_id", "course_id = ?", course_id, options, visitor)
    }
}

fn parse_enrollment_row(row: &Row<'_>) -> RepoResult<Enrollment> {
    Ok(Enrollment {
        student_id: row.get("student_id")?,
        course_id: row.get("course_id")?,
    })
}
