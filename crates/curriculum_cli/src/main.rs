//! CLI smoke entry point.
//!
//! # Responsibility
//! - Open the curriculum store (creating it when absent) and report its
//!   version and table row counts.
//! - Exit non-zero when the store cannot be initialized.
//!
//! Database path: first argument, then `CURRICULUM_DB_PATH`, then
//! `curriculum.db` in the working directory. Setting `CURRICULUM_LOG_DIR` to
//! an absolute path enables file logging.

use curriculum_core::db::DEFAULT_DB_FILE;
use curriculum_core::{
    CourseRepository, EnrollmentRepository, RepoResult, Store, StoreConfig, StudentRepository,
};
use log::error;
use std::path::PathBuf;
use std::process::ExitCode;

const DB_PATH_ENV: &str = "CURRICULUM_DB_PATH";
const LOG_DIR_ENV: &str = "CURRICULUM_LOG_DIR";

fn main() -> ExitCode {
    if let Ok(log_dir) = std::env::var(LOG_DIR_ENV) {
        if let Err(err) = curriculum_core::init_logging(curriculum_core::default_log_level(), &log_dir)
        {
            eprintln!("logging disabled: {err}");
        }
    }

    println!("curriculum_core ping={}", curriculum_core::ping());
    println!("curriculum_core version={}", curriculum_core::core_version());

    let config = StoreConfig::new(resolve_db_path());
    let mut store = match Store::open(&config) {
        Ok(store) => store,
        Err(err) => {
            error!("event=cli_start module=cli status=error error={}", err);
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };

    let status = match print_counts(&store) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("count failed: {err}");
            ExitCode::FAILURE
        }
    };
    store.close();
    status
}

fn resolve_db_path() -> PathBuf {
    std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| std::env::var_os(DB_PATH_ENV).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_FILE))
}

fn print_counts(store: &Store) -> RepoResult<()> {
    if let Some(path) = store.path() {
        println!("store path={}", path.display());
    }

    let mut courses = 0usize;
    store.courses()?.list(None, &mut |_| courses += 1)?;
    let mut students = 0usize;
    store.students()?.list(None, &mut |_| students += 1)?;
    let mut enrollments = 0usize;
    store.enrollments()?.list(None, &mut |_| enrollments += 1)?;

    println!("course rows={courses}");
    println!("student rows={students}");
    println!("enrollment rows={enrollments}");
    Ok(())
}
