//! Core persistence and query layer for the curriculum service.
//! This crate is the single source of truth for course/student/enrollment
//! invariants; transport and presentation layers only marshal data in and out.

pub mod db;
pub mod logging;
pub mod model;
pub mod query;
pub mod repo;
pub mod service;

pub use db::{DbError, JournalMode, Store, StoreConfig, StoreInitError};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::course::Course;
pub use model::enrollment::Enrollment;
pub use model::student::Student;
pub use model::{Entity, ValidationError};
pub use query::{QueryOptions, SortOrder};
pub use repo::course_repo::{CourseRepository, SqliteCourseRepository};
pub use repo::enrollment_repo::{EnrollmentRepository, SqliteEnrollmentRepository};
pub use repo::student_repo::{SqliteStudentRepository, StudentRepository};
pub use repo::{ConstraintViolation, ErrorKind, RepoError, RepoResult};
pub use service::consistency::{ConsistencyEngine, CREDIT_EPSILON};

/// Minimal health-check API.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
