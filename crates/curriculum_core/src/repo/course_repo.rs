//! Course repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide add/update/remove/list/find APIs over the `course` table.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Name/type/semester lookups use `LIKE` with the caller's raw pattern;
//!   `%` and `_` keep their SQLite wildcard meaning.
//! - `update` and `remove` go through the consistency engine so enrolled
//!   students' credits follow the course credit.

use crate::model::course::Course;
use crate::model::Entity;
use crate::query::{CourseColumn, QueryBuilder, QueryOptions};
use crate::repo::{execute_write, stream_rows, RepoResult};
use crate::service::consistency::ConsistencyEngine;
use log::debug;
use rusqlite::types::Value;
use rusqlite::{params, Connection, Row};

const COURSE_SELECT_SQL: &str = "SELECT
    course_id,
    name,
    type,
    total_hours,
    lecture_hours,
    lab_hours,
    credit,
    semester
FROM course";

/// Repository interface for course operations.
pub trait CourseRepository {
    /// Inserts a new course. Fails with a duplicate-key constraint if the id exists.
    fn add(&self, course: &Course) -> RepoResult<()>;
    /// Replaces every mutable field of an existing course.
    fn update(&self, course: &Course) -> RepoResult<()>;
    /// Removes one course after its enrollments.
    fn remove(&self, course_id: &str) -> RepoResult<()>;
    /// Removes every course and every enrollment.
    fn remove_all(&self) -> RepoResult<()>;
    fn list(&self, options: Option<&QueryOptions>, visitor: &mut dyn FnMut(Course))
        -> RepoResult<()>;
    fn find_by_id(
        &self,
        course_id: &str,
        options: Option<&QueryOptions>,
        visitor: &mut dyn FnMut(Course),
    ) -> RepoResult<()>;
    fn find_by_name(
        &self,
        pattern: &str,
        options: Option<&QueryOptions>,
        visitor: &mut dyn FnMut(Course),
    ) -> RepoResult<()>;
    fn find_by_type(
        &self,
        pattern: &str,
        options: Option<&QueryOptions>,
        visitor: &mut dyn FnMut(Course),
    ) -> RepoResult<()>;
    fn find_by_semester(
        &self,
        pattern: &str,
        options: Option<&QueryOptions>,
        visitor: &mut dyn FnMut(Course),
    ) -> RepoResult<()>;
}

/// SQLite-backed course repository.
pub struct SqliteCourseRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCourseRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn find_where(
        &self,
        op: &'static str,
        predicate: &str,
        value: &str,
        options: Option<&QueryOptions>,
        visitor: &mut dyn FnMut(Course),
    ) -> RepoResult<()> {
        let query = QueryBuilder::<CourseColumn>::new(format!("{COURSE_SELECT_SQL} WHERE {predicate}"))
            .bind(Value::Text(value.to_string()))
            .options(options)
            .build();
        stream_rows(self.conn, Entity::Course, op, &query, parse_course_row, visitor)
    }
}

impl CourseRepository for SqliteCourseRepository<'_> {
    fn add(&self, course: &Course) -> RepoResult<()> {
        course.validate()?;

        execute_write(
            self.conn,
            Entity::Course,
            "add",
            &course.course_id,
            "INSERT INTO course (
                course_id,
                name,
                type,
                total_hours,
                lecture_hours,
                lab_hours,
                credit,
                semester
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                course.course_id.as_str(),
                course.name.as_deref(),
                course.kind.as_deref(),
                course.total_hours,
                course.lecture_hours,
                course.lab_hours,
                course.credit,
                course.semester.as_deref(),
            ],
        )?;

        debug!(
            "event=course_add module=repo status=ok course_id={}",
            course.course_id
        );
        Ok(())
    }

    fn update(&self, course: &Course) -> RepoResult<()> {
        ConsistencyEngine::new(self.conn).update_course(course)
    }

    fn remove(&self, course_id: &str) -> RepoResult<()> {
        ConsistencyEngine::new(self.conn).remove_course(course_id)
    }

    fn remove_all(&self) -> RepoResult<()> {
        ConsistencyEngine::new(self.conn).remove_all_courses()
    }

    fn list(
        &self,
        options: Option<&QueryOptions>,
        visitor: &mut dyn FnMut(Course),
    ) -> RepoResult<()> {
        let query = QueryBuilder::<CourseColumn>::new(COURSE_SELECT_SQL)
            .options(options)
            .build();
        stream_rows(self.conn, Entity::Course, "list", &query, parse_course_row, visitor)
    }

    fn find_by_id(
        &self,
        course_id: &str,
        options: Option<&QueryOptions>,
        visitor: &mut dyn FnMut(Course),
    ) -> RepoResult<()> {
        self.find_where("find_by_id", "course_id = ?", course_id, options, visitor)
    }

    fn find_by_name(
        &self,
        pattern: &str,
        options: Option<&QueryOptions>,
        visitor: &mut dyn FnMut(Course),
    ) -> RepoResult<()> {
        self.find_where("find_by_name", "name LIKE ?", pattern, options, visitor)
    }

    fn find_by_type(
        &self,
        pattern: &str,
        options: Option<&QueryOptions>,
        visitor: &mut dyn FnMut(Course),
    ) -> RepoResult<()> {
        self.find_where("find_by_type", "type LIKE ?", pattern, options, visitor)
    }

    fn find_by_semester(
        &self,
        pattern: &str,
        options: Option<&QueryOptions>,
        visitor: &mut dyn FnMut(Course),
    ) -> RepoResult<()> {
        self.find_where("find_by_semester", "semester LIKE ?", pattern, options, visitor)
    }
}

fn parse_course_row(row: &Row<'_>) -> RepoResult<Course> {
    Ok(Course {
        course_id: row.get("course_id")?,
        name: row.get("name")?,
        kind: row.get("type")?,
        total_hours: row.get::<_, Option<f64>>("total_hours")?.unwrap_or(0.0),
        lecture_hours: row.get::<_, Option<f64>>("lecture_hours")?.unwrap_or(0.0),
        lab_hours: row.get::<_, Option<f64>>("lab_hours")?.unwrap_or(0.0),
        credit: row.get("credit")?,
        semester: row.get("semester")?,
    })
}
