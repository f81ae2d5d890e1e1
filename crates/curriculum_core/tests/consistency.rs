use curriculum_core::{
    ConstraintViolation, Course, CourseRepository, Enrollment, EnrollmentRepository, Entity,
    ErrorKind, RepoError, Store, StoreConfig, Student, StudentRepository, CREDIT_EPSILON,
};
use std::collections::HashMap;
use std::thread;

fn seeded_store() -> Store {
    let store = Store::open_in_memory().unwrap();
    {
        let courses = store.courses().unwrap();
        courses.add(&Course::new("C1", 3.0).with_name("Algebra")).unwrap();
        courses.add(&Course::new("C2", 4.0).with_name("Physics")).unwrap();
        let students = store.students().unwrap();
        students.add(&Student::new("S1", "Ann")).unwrap();
        students.add(&Student::new("S2", "Bob")).unwrap();
    }
    store
}

fn credits(store: &Store, student_id: &str) -> f64 {
    let mut value = None;
    store
        .students()
        .unwrap()
        .find_by_id(student_id, None, &mut |row| value = Some(row.credits))
        .unwrap();
    value.unwrap()
}

fn enrollment_pairs(store: &Store) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    store
        .enrollments()
        .unwrap()
        .list(None, &mut |row| pairs.push((row.student_id, row.course_id)))
        .unwrap();
    pairs.sort();
    pairs
}

fn course_count(store: &Store) -> usize {
    let mut count = 0;
    store
        .courses()
        .unwrap()
        .list(None, &mut |_| count += 1)
        .unwrap();
    count
}

/// Asserts every student's credits equal the summed credit of their courses.
fn assert_credits_consistent(store: &Store) {
    let mut course_credit = HashMap::new();
    store
        .courses()
        .unwrap()
        .list(None, &mut |row| {
            course_credit.insert(row.course_id, row.credit);
        })
        .unwrap();

    let mut expected: HashMap<String, f64> = HashMap::new();
    for (student_id, course_id) in enrollment_pairs(store) {
        *expected.entry(student_id).or_default() += course_credit[&course_id];
    }

    let mut students = Vec::new();
    store
        .students()
        .unwrap()
        .list(None, &mut |row| students.push(row))
        .unwrap();
    for student in students {
        let want = expected.get(&student.student_id).copied().unwrap_or(0.0);
        assert!(
            (student.credits - want).abs() < 1e-6,
            "student {} has {} credits, expected {}",
            student.student_id,
            student.credits,
            want
        );
        assert!(student.credits >= 0.0);
    }
}

#[test]
fn enroll_then_unenroll_returns_credits_to_zero() {
    let store = seeded_store();
    let enrollments = store.enrollments().unwrap();

    enrollments.add(&Enrollment::new("S1", "C1")).unwrap();
    assert_eq!(credits(&store, "S1"), 3.0);

    enrollments.remove("S1", "C1").unwrap();
    assert_eq!(credits(&store, "S1"), 0.0);
    assert!(enrollment_pairs(&store).is_empty());
}

#[test]
fn enroll_into_missing_course_writes_nothing() {
    let store = seeded_store();

    let err = store
        .enrollments()
        .unwrap()
        .add(&Enrollment::new("S1", "C9"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(matches!(
        err,
        RepoError::NotFound {
            entity: Entity::Course,
            ref id,
        } if id == "C9"
    ));
    assert!(enrollment_pairs(&store).is_empty());
    assert_eq!(credits(&store, "S1"), 0.0);
}

#[test]
fn enroll_missing_student_is_not_found() {
    let store = seeded_store();

    let err = store
        .enrollments()
        .unwrap()
        .add(&Enrollment::new("S9", "C1"))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::NotFound {
            entity: Entity::Student,
            ..
        }
    ));
    assert!(enrollment_pairs(&store).is_empty());
}

#[test]
fn duplicate_enrollment_keeps_credits() {
    let store = seeded_store();
    let enrollments = store.enrollments().unwrap();
    enrollments.add(&Enrollment::new("S1", "C1")).unwrap();

    let err = enrollments.add(&Enrollment::new("S1", "C1")).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Constraint(ConstraintViolation::DuplicateKey {
            entity: Entity::Enrollment,
            ..
        })
    ));
    assert_eq!(credits(&store, "S1"), 3.0);
    assert_eq!(enrollment_pairs(&store).len(), 1);
}

#[test]
fn unenroll_missing_pair_is_not_found_and_keeps_credits() {
    let store = seeded_store();
    let enrollments = store.enrollments().unwrap();
    enrollments.add(&Enrollment::new("S1", "C1")).unwrap();

    let err = enrollments.remove("S1", "C2").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(credits(&store, "S1"), 3.0);
}

#[test]
fn unenroll_that_would_go_negative_rolls_back() {
    let store = seeded_store();
    store
        .enrollments()
        .unwrap()
        .add(&Enrollment::new("S1", "C1"))
        .unwrap();
    store
        .students()
        .unwrap()
        .update(&Student::new("S1", "Ann").with_credits(1.0))
        .unwrap();

    let err = store
        .enrollments()
        .unwrap()
        .remove("S1", "C1")
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Constraint(ConstraintViolation::Check { .. })
    ));
    assert_eq!(credits(&store, "S1"), 1.0);
    assert_eq!(
        enrollment_pairs(&store),
        vec![("S1".to_string(), "C1".to_string())]
    );
}

#[test]
fn dangling_enrollment_is_removed_without_credit_change() {
    let store = seeded_store();
    store
        .enrollments()
        .unwrap()
        .add(&Enrollment::new("S1", "C1"))
        .unwrap();

    let conn = store.connection().unwrap();
    conn.execute_batch("PRAGMA foreign_keys = OFF;").unwrap();
    conn.execute("DELETE FROM course WHERE course_id = 'C1';", [])
        .unwrap();

    store
        .enrollments()
        .unwrap()
        .remove("S1", "C1")
        .unwrap();
    assert!(enrollment_pairs(&store).is_empty());
    assert_eq!(credits(&store, "S1"), 3.0);
}

#[test]
fn enrollment_of_deleted_student_can_still_be_removed() {
    let store = seeded_store();
    store
        .enrollments()
        .unwrap()
        .add(&Enrollment::new("S1", "C1"))
        .unwrap();

    let conn = store.connection().unwrap();
    conn.execute_batch("PRAGMA foreign_keys = OFF;").unwrap();
    conn.execute("DELETE FROM student WHERE student_id = 'S1';", [])
        .unwrap();

    store
        .enrollments()
        .unwrap()
        .remove("S1", "C1")
        .unwrap();
    assert!(enrollment_pairs(&store).is_empty());
    assert_eq!(course_count(&store), 2);
}

#[test]
fn float_credits_return_exactly_to_zero() {
    let store = Store::open_in_memory().unwrap();
    let courses = store.courses().unwrap();
    courses.add(&Course::new("F1", 0.1)).unwrap();
    courses.add(&Course::new("F2", 0.2)).unwrap();
    courses.add(&Course::new("F3", 0.7)).unwrap();
    store
        .students()
        .unwrap()
        .add(&Student::new("S1", "Ann"))
        .unwrap();

    let enrollments = store.enrollments().unwrap();
    for course_id in ["F1", "F2", "F3"] {
        enrollments.add(&Enrollment::new("S1", course_id)).unwrap();
        assert_credits_consistent(&store);
    }
    for course_id in ["F3", "F1", "F2"] {
        enrollments.remove("S1", course_id).unwrap();
        assert_credits_consistent(&store);
    }
    assert_eq!(credits(&store, "S1"), 0.0);
    assert!(CREDIT_EPSILON > 0.0);
}

#[test]
fn credits_track_mixed_operation_sequence() {
    let store = seeded_store();
    store
        .courses()
        .unwrap()
        .add(&Course::new("C3", 0.3))
        .unwrap();
    let enrollments = store.enrollments().unwrap();

    enrollments.add(&Enrollment::new("S1", "C1")).unwrap();
    enrollments.add(&Enrollment::new("S1", "C3")).unwrap();
    enrollments.add(&Enrollment::new("S2", "C2")).unwrap();
    enrollments.add(&Enrollment::new("S2", "C3")).unwrap();
    assert_credits_consistent(&store);

    let _ = enrollments.add(&Enrollment::new("S2", "C2"));
    let _ = enrollments.add(&Enrollment::new("S2", "C404"));
    let _ = enrollments.remove("S1", "C2");
    assert_credits_consistent(&store);

    store
        .courses()
        .unwrap()
        .update(&Course::new("C3", 1.2))
        .unwrap();
    assert_credits_consistent(&store);
    assert!((credits(&store, "S1") - 4.2).abs() < 1e-9);

    store.courses().unwrap().remove("C1").unwrap();
    assert_credits_consistent(&store);

    enrollments.remove("S2", "C3").unwrap();
    assert_credits_consistent(&store);
    assert!((credits(&store, "S2") - 4.0).abs() < 1e-9);
}

#[test]
fn removing_course_cascades_and_debits_credits() {
    let store = seeded_store();
    let enrollments = store.enrollments().unwrap();
    enrollments.add(&Enrollment::new("S1", "C1")).unwrap();
    enrollments.add(&Enrollment::new("S1", "C2")).unwrap();
    enrollments.add(&Enrollment::new("S2", "C1")).unwrap();

    store.courses().unwrap().remove("C1").unwrap();

    assert_eq!(
        enrollment_pairs(&store),
        vec![("S1".to_string(), "C2".to_string())]
    );
    assert_eq!(credits(&store, "S1"), 4.0);
    assert_eq!(credits(&store, "S2"), 0.0);
    assert_eq!(course_count(&store), 1);
}

#[test]
fn removing_student_cascades_enrollments() {
    let store = seeded_store();
    let enrollments = store.enrollments().unwrap();
    enrollments.add(&Enrollment::new("S1", "C1")).unwrap();
    enrollments.add(&Enrollment::new("S2", "C1")).unwrap();

    store.students().unwrap().remove("S1").unwrap();

    assert_eq!(
        enrollment_pairs(&store),
        vec![("S2".to_string(), "C1".to_string())]
    );
    assert_eq!(credits(&store, "S2"), 3.0);
    assert_eq!(course_count(&store), 2);
}

#[test]
fn course_credit_change_shifts_enrolled_students() {
    let store = seeded_store();
    store
        .enrollments()
        .unwrap()
        .add(&Enrollment::new("S1", "C1"))
        .unwrap();

    store
        .courses()
        .unwrap()
        .update(&Course::new("C1", 5.0).with_name("Algebra II"))
        .unwrap();
    assert_eq!(credits(&store, "S1"), 5.0);
    assert_eq!(credits(&store, "S2"), 0.0);

    store
        .courses()
        .unwrap()
        .update(&Course::new("C1", 3.0))
        .unwrap();
    assert_eq!(credits(&store, "S1"), 3.0);
}

#[test]
fn course_removal_succeeds_after_credit_overwrite() {
    let store = seeded_store();
    let enrollments = store.enrollments().unwrap();
    enrollments.add(&Enrollment::new("S1", "C1")).unwrap();
    enrollments.add(&Enrollment::new("S1", "C2")).unwrap();
    store
        .students()
        .unwrap()
        .update(&Student::new("S1", "Ann").with_credits(1.0))
        .unwrap();

    store.courses().unwrap().remove("C1").unwrap();

    assert_eq!(course_count(&store), 1);
    assert_eq!(
        enrollment_pairs(&store),
        vec![("S1".to_string(), "C2".to_string())]
    );
    assert_eq!(credits(&store, "S1"), 4.0);
    assert_credits_consistent(&store);
}

#[test]
fn remove_all_courses_succeeds_after_credit_overwrite() {
    let store = seeded_store();
    store
        .enrollments()
        .unwrap()
        .add(&Enrollment::new("S1", "C1"))
        .unwrap();
    store
        .students()
        .unwrap()
        .update(&Student::new("S1", "Ann").with_credits(0.5))
        .unwrap();

    store.courses().unwrap().remove_all().unwrap();

    assert_eq!(course_count(&store), 0);
    assert!(enrollment_pairs(&store).is_empty());
    assert_eq!(credits(&store, "S1"), 0.0);
}

#[test]
fn course_credit_drop_succeeds_after_credit_overwrite() {
    let store = seeded_store();
    store
        .enrollments()
        .unwrap()
        .add(&Enrollment::new("S1", "C1"))
        .unwrap();
    store
        .students()
        .unwrap()
        .update(&Student::new("S1", "Ann").with_credits(1.0))
        .unwrap();

    store
        .courses()
        .unwrap()
        .update(&Course::new("C1", 1.0))
        .unwrap();

    let mut stored_credit = None;
    store
        .courses()
        .unwrap()
        .find_by_id("C1", None, &mut |row| stored_credit = Some(row.credit))
        .unwrap();
    assert_eq!(stored_credit, Some(1.0));
    assert_eq!(credits(&store, "S1"), 1.0);
    assert_credits_consistent(&store);
}

#[test]
fn remove_all_courses_clears_enrollments_and_credit() {
    let store = seeded_store();
    let enrollments = store.enrollments().unwrap();
    enrollments.add(&Enrollment::new("S1", "C1")).unwrap();
    enrollments.add(&Enrollment::new("S1", "C2")).unwrap();

    store.courses().unwrap().remove_all().unwrap();

    assert_eq!(course_count(&store), 0);
    assert!(enrollment_pairs(&store).is_empty());
    assert_eq!(credits(&store, "S1"), 0.0);
}

#[test]
fn remove_all_students_clears_enrollments() {
    let store = seeded_store();
    store
        .enrollments()
        .unwrap()
        .add(&Enrollment::new("S1", "C1"))
        .unwrap();

    store.students().unwrap().remove_all().unwrap();

    assert!(enrollment_pairs(&store).is_empty());
    assert_eq!(course_count(&store), 2);
    let mut students = 0;
    store
        .students()
        .unwrap()
        .list(None, &mut |_| students += 1)
        .unwrap();
    assert_eq!(students, 0);
}

#[test]
fn remove_all_enrollments_resets_credits() {
    let store = seeded_store();
    let enrollments = store.enrollments().unwrap();
    enrollments.add(&Enrollment::new("S1", "C1")).unwrap();
    enrollments.add(&Enrollment::new("S2", "C2")).unwrap();

    enrollments.remove_all().unwrap();

    assert!(enrollment_pairs(&store).is_empty());
    assert_eq!(credits(&store, "S1"), 0.0);
    assert_eq!(credits(&store, "S2"), 0.0);
}

#[test]
fn enrollment_lookups_filter_by_side() {
    let store = seeded_store();
    let enrollments = store.enrollments().unwrap();
    enrollments.add(&Enrollment::new("S1", "C1")).unwrap();
    enrollments.add(&Enrollment::new("S1", "C2")).unwrap();
    enrollments.add(&Enrollment::new("S2", "C2")).unwrap();

    let mut courses = Vec::new();
    enrollments
        .find_by_student_id("S1", None, &mut |row| courses.push(row.course_id))
        .unwrap();
    courses.sort();
    assert_eq!(courses, vec!["C1", "C2"]);

    let mut students = Vec::new();
    enrollments
        .find_by_course_id("C2", None, &mut |row| students.push(row.student_id))
        .unwrap();
    students.sort();
    assert_eq!(students, vec!["S1", "S2"]);
}

#[test]
fn concurrent_stores_keep_credits_consistent() {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig::new(dir.path().join("shared.db"));

    {
        let store = Store::open(&config).unwrap();
        let students = store.students().unwrap();
        students.add(&Student::new("S1", "Ann")).unwrap();
        students.add(&Student::new("S2", "Bob")).unwrap();
    }

    let workers: Vec<_> = ["S1", "S2"]
        .into_iter()
        .map(|student_id| {
            let config = config.clone();
            thread::spawn(move || {
                let store = Store::open(&config).unwrap();
                for index in 0..20 {
                    let course_id = format!("{student_id}-C{index}");
                    store
                        .courses()
                        .unwrap()
                        .add(&Course::new(course_id.as_str(), 0.5))
                        .unwrap();
                    store
                        .enrollments()
                        .unwrap()
                        .add(&Enrollment::new(student_id, course_id.as_str()))
                        .unwrap();
                    if index % 3 == 0 {
                        store
                            .enrollments()
                            .unwrap()
                            .remove(student_id, &course_id)
                            .unwrap();
                    }
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    let store = Store::open(&config).unwrap();
    assert_credits_consistent(&store);
    assert_eq!(credits(&store, "S1"), 6.5);
    assert_eq!(credits(&store, "S2"), 6.5);
}
