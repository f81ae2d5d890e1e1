//! Student repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide add/update/remove/list/find APIs over the `student` table.
//!
//! # Invariants
//! - `credits` is written exactly as supplied on add/update (administrative
//!   set); it must be `>= 0`, enforced by validation and by the column CHECK.
//! - Removal cascades through the consistency engine.

use crate::model::student::Student;
use crate::model::Entity;
use crate::query::{QueryBuilder, QueryOptions, StudentColumn};
use crate::repo::{execute_write, stream_rows, RepoError, RepoResult};
use crate::service::consistency::ConsistencyEngine;
use log::debug;
use rusqlite::types::Value;
use rusqlite::{params, Connection, Row};

const STUDENT_SELECT_SQL: &str = "SELECT
    student_id,
    name,
    email,
    credits
FROM student";

/// Repository interface for student operations.
pub trait StudentRepository {
    /// Inserts a new student with the supplied credits.
    fn add(&self, student: &Student) -> RepoResult<()>;
    /// Replaces name, email and credits of an existing student.
    fn update(&self, student: &Student) -> RepoResult<()>;
    /// Removes one student after its enrollments.
    fn remove(&self, student_id: &str) -> RepoResult<()>;
    /// Removes every student and every enrollment.
    fn remove_all(&self) -> RepoResult<()>;
    fn list(
        &self,
        options: Option<&QueryOptions>,
        visitor: &mut dyn FnMut(Student),
    ) -> RepoResult<()>;
    fn find_by_id(
        &self,
        student_id: &str,
        options: Option<&QueryOptions>,
        visitor: &mut dyn FnMut(Student),
    ) -> RepoResult<()>;
    fn find_by_name(
        &self,
        pattern: &str,
        options: Option<&QueryOptions>,
        visitor: &mut dyn FnMut(Student),
    ) -> RepoResult<()>;
}

/// SQLite-backed student repository.
pub struct SqliteStudentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteStudentRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn find_where(
        &self,
        op: &'static str,
        predicate: &str,
        value: &str,
        options: Option<&QueryOptions>,
        visitor: &mut dyn FnMut(Student),
    ) -> RepoResult<()> {
        let query =
            QueryBuilder::<StudentColumn>::new(format!("{STUDENT_SELECT_SQL} WHERE {predicate}"))
                .bind(Value::Text(value.to_string()))
                .options(options)
                .build();
        stream_rows(self.conn, Entity::Student, op, &query, parse_student_row, visitor)
    }
}

impl StudentRepository for SqliteStudentRepository<'_> {
    fn add(&self, student: &Student) -> RepoResult<()> {
        student.validate()?;

        execute_write(
            self.conn,
            Entity::Student,
            "add",
            &student.student_id,
            "INSERT INTO student (student_id, name, email, credits)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                student.student_id.as_str(),
                student.name.as_str(),
                student.email.as_deref(),
                student.credits,
            ],
        )?;

        debug!(
            "event=student_add module=repo status=ok student_id={}",
            student.student_id
        );
        Ok(())
    }

    fn update(&self, student: &Student) -> RepoResult<()> {
        student.validate()?;

        let changed = execute_write(
            self.conn,
            Entity::Student,
            "update",
            &student.student_id,
            "UPDATE student
             SET
                name = ?1,
                email = ?2,
                credits = ?3
             WHERE student_id = ?4;",
            params![
                student.name.as_str(),
                student.email.as_deref(),
                student.credits,
                student.student_id.as_str(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::not_found(
                Entity::Student,
                student.student_id.as_str(),
            ));
        }

        Ok(())
    }

    fn remove(&self, student_id: &str) -> RepoResult<()> {
        ConsistencyEngine::new(self.conn).remove_student(student_id)
    }

    fn remove_all(&self) -> RepoResult<()> {
        ConsistencyEngine::new(self.conn).remove_all_students()
    }

    fn list(
        &self,
        options: Option<&QueryOptions>,
        visitor: &mut dyn FnMut(Student),
    ) -> RepoResult<()> {
        let query = QueryBuilder::<StudentColumn>::new(STUDENT_SELECT_SQL)
            .options(options)
            .build();
        stream_rows(self.conn, Entity::Student, "list", &query, parse_student_row, visitor)
    }

    fn find_by_id(
        &self,
        student_id: &str,
        options: Option<&QueryOptions>,
        visitor: &mut dyn FnMut(Student),
    ) -> RepoResult<()> {
        self.find_where("find_by_id", "student_id = ?", student_id, options, visitor)
    }

    fn find_by_name(
        &self,
        pattern: &str,
        options: Option<&QueryOptions>,
        visitor: &mut dyn FnMut(Student),
    ) -> RepoResult<()> {
        self.find_where("find_by_name", "name LIKE ?", pattern, options, visitor)
    }
}

fn parse_student_row(row: &Row<'_>) -> RepoResult<Student> {
    let student = Student {
        student_id: row.get("student_id")?,
        name: row.get("name")?,
        email: row.get("email")?,
        credits: row.get("credits")?,
    };
    if student.credits < 0.0 {
        return Err(RepoError::InvalidData(format!(
            "negative credits {} for student `{}`",
            student.credits, student.student_id
        )));
    }
    Ok(student)
}
