//! Cross-entity consistency rules.
//!
//! # Responsibility
//! - Sequence the statements of every mutation that touches more than one
//!   table: enroll, unenroll, course update/removal, student removal and the
//!   bulk clears.
//! - Keep `student.credits` equal to the sum of enrolled course credit.
//!
//! # Invariants
//! - Each public operation runs in one `IMMEDIATE` transaction; on any error
//!   the transaction rolls back and no partial state is visible.
//! - Enrollments are deleted before the course/student they reference.
//! - Credit adjustments that land within [`CREDIT_EPSILON`] of zero are
//!   stored as `0.0`; anything further below zero fails the `CHECK` on
//!   `student.credits` and aborts the operation.
//! - Course update and removal recompute enrolled students' credits from
//!   their remaining enrollments, so an administrative credit overwrite never
//!   blocks a course change.

use crate::model::course::Course;
use crate::model::enrollment::Enrollment;
use crate::model::Entity;
use crate::repo::{execute_write, log_write_failure, RepoError, RepoResult};
use log::{info, warn};
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};

/// Float residue tolerated when a credit total returns to zero.
pub const CREDIT_EPSILON: f64 = 1e-9;

const ADJUST_CREDITS_SQL: &str = "UPDATE student
     SET credits = CASE
        WHEN ABS(credits + ?1) < ?2 THEN 0.0
        ELSE credits + ?1
     END
     WHERE student_id = ?3;";

/// Recomputes credits for students enrolled in `?1`, ignoring enrollments in
/// course `?2` (`NULL` keeps every course).
const RECOMPUTE_ENROLLED_CREDITS_SQL: &str = "UPDATE student
     SET credits = MAX(
        COALESCE(
            (SELECT SUM(c.credit)
             FROM enrollment e
             INNER JOIN course c ON c.course_id = e.course_id
             WHERE e.student_id = student.student_id
               AND e.course_id IS NOT ?2),
            0.0
        ),
        0.0
     )
     WHERE student_id IN (
        SELECT student_id FROM enrollment WHERE course_id = ?1
     );";

const RESET_ENROLLED_CREDITS_SQL: &str = "UPDATE student
     SET credits = 0.0
     WHERE student_id IN (SELECT student_id FROM enrollment);";

/// Applies multi-table mutations atomically over a borrowed connection.
pub struct ConsistencyEngine<'conn> {
    conn: &'conn Connection,
}

impl<'conn> ConsistencyEngine<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Enrolls `student_id` into `course_id` and credits the student.
    ///
    /// # Errors
    /// - `NotFound` when the student or the course does not exist; nothing is
    ///   written in that case.
    /// - Duplicate-key constraint when the pair is already enrolled.
    pub fn enroll(&self, enrollment: &Enrollment) -> RepoResult<()> {
        let key = enrollment_key(&enrollment.student_id, &enrollment.course_id);
        self.run("enroll", Entity::Enrollment, &key, |tx| {
            enrollment.validate()?;
            if !student_exists(tx, &enrollment.student_id)? {
                return Err(RepoError::not_found(
                    Entity::Student,
                    enrollment.student_id.as_str(),
                ));
            }
            let credit = course_credit(tx, &enrollment.course_id)?.ok_or_else(|| {
                RepoError::not_found(Entity::Course, enrollment.course_id.as_str())
            })?;

            execute_write(
                tx,
                Entity::Enrollment,
                "enroll",
                &key,
                "INSERT INTO enrollment (student_id, course_id) VALUES (?1, ?2);",
                params![enrollment.student_id, enrollment.course_id],
            )?;
            adjust_credits(tx, &enrollment.student_id, credit)?;
            Ok(())
        })
    }

    /// Removes one enrollment and debits the course credit from the student.
    ///
    /// A course that no longer exists contributes a credit of `0.0`, and a
    /// student that no longer exists is not credited, so a dangling
    /// enrollment can still be removed.
    ///
    /// # Errors
    /// - `NotFound` when the pair is not enrolled; credits are untouched.
    /// - Check constraint when the debit would leave credits below zero.
    pub fn unenroll(&self, student_id: &str, course_id: &str) -> RepoResult<()> {
        let key = enrollment_key(student_id, course_id);
        self.run("unenroll", Entity::Enrollment, &key, |tx| {
            let credit = course_credit(tx, course_id)?.unwrap_or(0.0);

            let removed = execute_write(
                tx,
                Entity::Enrollment,
                "unenroll",
                &key,
                "DELETE FROM enrollment WHERE student_id = ?1 AND course_id = ?2;",
                params![student_id, course_id],
            )?;
            if removed == 0 {
                return Err(RepoError::not_found(Entity::Enrollment, key.as_str()));
            }

            if student_exists(tx, student_id)? {
                adjust_credits(tx, student_id, -credit)?;
            } else {
                warn!(
                    "event=unenroll module=consistency status=dangling student_id={} course_id={}",
                    student_id, course_id
                );
            }
            Ok(())
        })
    }

    /// Replaces a course row and recomputes enrolled students' credits.
    pub fn update_course(&self, course: &Course) -> RepoResult<()> {
        self.run("update_course", Entity::Course, &course.course_id, |tx| {
            course.validate()?;
            let previous = course_credit(tx, &course.course_id)?
                .ok_or_else(|| RepoError::not_found(Entity::Course, course.course_id.as_str()))?;

            execute_write(
                tx,
                Entity::Course,
                "update",
                &course.course_id,
                "UPDATE course
                 SET
                    name = ?1,
                    type = ?2,
                    total_hours = ?3,
                    lecture_hours = ?4,
                    lab_hours = ?5,
                    credit = ?6,
                    semester = ?7
                 WHERE course_id = ?8;",
                params![
                    course.name.as_deref(),
                    course.kind.as_deref(),
                    course.total_hours,
                    course.lecture_hours,
                    course.lab_hours,
                    course.credit,
                    course.semester.as_deref(),
                    course.course_id.as_str(),
                ],
            )?;

            if course.credit != previous {
                recompute_enrolled_credits(tx, &course.course_id, None)?;
            }
            Ok(())
        })
    }

    /// Removes a course and its enrollments, then recomputes the credits of
    /// the students who were enrolled.
    pub fn remove_course(&self, course_id: &str) -> RepoResult<()> {
        self.run("remove_course", Entity::Course, course_id, |tx| {
            if course_credit(tx, course_id)?.is_none() {
                return Err(RepoError::not_found(Entity::Course, course_id));
            }

            recompute_enrolled_credits(tx, course_id, Some(course_id))?;
            let enrollments = execute_write(
                tx,
                Entity::Enrollment,
                "remove_course",
                course_id,
                "DELETE FROM enrollment WHERE course_id = ?1;",
                [course_id],
            )?;
            execute_write(
                tx,
                Entity::Course,
                "remove",
                course_id,
                "DELETE FROM course WHERE course_id = ?1;",
                [course_id],
            )?;

            info!(
                "event=course_remove module=consistency status=cascade course_id={} enrollments_removed={}",
                course_id, enrollments
            );
            Ok(())
        })
    }

    /// Removes a student and its enrollments.
    pub fn remove_student(&self, student_id: &str) -> RepoResult<()> {
        self.run("remove_student", Entity::Student, student_id, |tx| {
            if !student_exists(tx, student_id)? {
                return Err(RepoError::not_found(Entity::Student, student_id));
            }

            let enrollments = execute_write(
                tx,
                Entity::Enrollment,
                "remove_student",
                student_id,
                "DELETE FROM enrollment WHERE student_id = ?1;",
                [student_id],
            )?;
            execute_write(
                tx,
                Entity::Student,
                "remove",
                student_id,
                "DELETE FROM student WHERE student_id = ?1;",
                [student_id],
            )?;

            info!(
                "event=student_remove module=consistency status=cascade student_id={} enrollments_removed={}",
                student_id, enrollments
            );
            Ok(())
        })
    }

    /// Removes every course and enrollment; enrolled students end at zero.
    pub fn remove_all_courses(&self) -> RepoResult<()> {
        self.run("remove_all_courses", Entity::Course, "*", |tx| {
            execute_write(
                tx,
                Entity::Student,
                "remove_all_courses",
                "*",
                RESET_ENROLLED_CREDITS_SQL,
                [],
            )?;
            clear_table(tx, Entity::Enrollment)?;
            clear_table(tx, Entity::Course)?;
            Ok(())
        })
    }

    /// Removes every student and enrollment.
    pub fn remove_all_students(&self) -> RepoResult<()> {
        self.run("remove_all_students", Entity::Student, "*", |tx| {
            clear_table(tx, Entity::Enrollment)?;
            clear_table(tx, Entity::Student)?;
            Ok(())
        })
    }

    /// Removes every enrollment and resets every student's credits to zero.
    pub fn remove_all_enrollments(&self) -> RepoResult<()> {
        self.run("remove_all_enrollments", Entity::Enrollment, "*", |tx| {
            clear_table(tx, Entity::Enrollment)?;
            execute_write(
                tx,
                Entity::Student,
                "remove_all_enrollments",
                "*",
                "UPDATE student SET credits = 0.0;",
                [],
            )?;
            Ok(())
        })
    }

    fn run<F>(&self, op: &'static str, entity: Entity, key: &str, body: F) -> RepoResult<()>
    where
        F: FnOnce(&Transaction<'_>) -> RepoResult<()>,
    {
        let result = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)
            .map_err(RepoError::from)
            .and_then(|tx| {
                body(&tx)?;
                tx.commit()?;
                Ok(())
            });

        match &result {
            Ok(()) => info!(
                "event={} module=consistency status=ok entity={} key={}",
                op, entity, key
            ),
            Err(err) => log_write_failure(entity, op, err),
        }
        result
    }
}

fn enrollment_key(student_id: &str, course_id: &str) -> String {
    format!("{student_id}/{course_id}")
}

fn student_exists(conn: &Connection, student_id: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM student WHERE student_id = ?1);",
        [student_id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn course_credit(conn: &Connection, course_id: &str) -> RepoResult<Option<f64>> {
    let credit = conn
        .query_row(
            "SELECT credit FROM course WHERE course_id = ?1;",
            [course_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(credit)
}

fn adjust_credits(conn: &Connection, student_id: &str, delta: f64) -> RepoResult<()> {
    let changed = execute_write(
        conn,
        Entity::Student,
        "adjust_credits",
        student_id,
        ADJUST_CREDITS_SQL,
        params![delta, CREDIT_EPSILON, student_id],
    )?;
    if changed == 0 {
        return Err(RepoError::not_found(Entity::Student, student_id));
    }
    Ok(())
}

fn recompute_enrolled_credits(
    conn: &Connection,
    course_id: &str,
    excluded_course: Option<&str>,
) -> RepoResult<usize> {
    execute_write(
        conn,
        Entity::Student,
        "recompute_credits",
        course_id,
        RECOMPUTE_ENROLLED_CREDITS_SQL,
        params![course_id, excluded_course],
    )
}

fn clear_table(conn: &Connection, entity: Entity) -> RepoResult<usize> {
    let removed = execute_write(
        conn,
        entity,
        "remove_all",
        "*",
        &format!("DELETE FROM {};", entity.table()),
        [],
    )?;
    info!(
        "event=table_clear module=consistency status=ok table={} rows_removed={}",
        entity, removed
    );
    Ok(removed)
}
