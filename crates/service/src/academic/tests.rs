use std::sync::Arc;

use chrono::Duration;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

use models::{assignment, audit_log, course, enrollment, submission, user};

use super::{Policy, SubmissionState};
use crate::clock::Clock;
use crate::context::{Caller, Role};
use crate::errors::ServiceError;
use crate::pagination::Pagination;
use crate::test_support::Harness;

async fn course_with_assignment(h: &Harness, prof: &Caller, days: i64) -> anyhow::Result<(course::Model, assignment::Model)> {
    let c = h.svc.create_course(prof, None, "Algorithms", "sorting and searching").await?;
    let a = h
        .svc
        .create_assignment(prof, c.id, "Quicksort", "implement it", 100.0, later(h, Duration::days(days)))
        .await?;
    Ok((c, a))
}

fn later(h: &Harness, d: Duration) -> models::DateTimeWithTimeZone {
    h.clock.now() + d
}

async fn audit_count(h: &Harness, action: &str) -> anyhow::Result<u64> {
    Ok(audit_log::Entity::find().filter(audit_log::Column::Action.eq(action)).count(&h.db).await?)
}

#[tokio::test]
async fn registered_user_authenticates_with_same_role() -> anyhow::Result<()> {
    let h = Harness::new().await?;
    for (name, role) in [("ann", Role::Admin), ("ivan", Role::Instructor), ("sara", Role::Student)] {
        let caller = h.user(name, role).await?;
        let session = h.auth.authenticate(name, "password123").await?;
        assert_eq!(session.user_id, caller.user_id);
        assert_eq!(session.role, role);
        let from_token = h.auth.verify_token(session.token.as_deref().expect("token"))?;
        assert_eq!(from_token, caller);
    }
    assert_eq!(audit_count(&h, "Register").await?, 3);
    assert_eq!(audit_count(&h, "Login").await?, 3);
    Ok(())
}

#[tokio::test]
async fn stored_credential_is_a_salted_hash() -> anyhow::Result<()> {
    let h = Harness::new().await?;
    let c = h.user("alice", Role::Student).await?;
    let row = user::Entity::find_by_id(c.user_id).one(&h.db).await?.expect("row");
    assert_ne!(row.password_hash, "password123");
    assert!(row.password_hash.starts_with("$argon2"));
    Ok(())
}

#[tokio::test]
async fn duplicate_username_leaves_one_row() -> anyhow::Result<()> {
    let h = Harness::new().await?;
    h.user("alice", Role::Student).await?;
    let err = h
        .auth
        .register(crate::auth::domain::RegisterInput {
            username: "alice".into(),
            email: "someone-else@example.com".into(),
            password: "password123".into(),
            role: Role::Instructor,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::DuplicateUsername));
    assert_eq!(user::Entity::find().count(&h.db).await?, 1);
    Ok(())
}

#[tokio::test]
async fn failed_login_is_audited_without_leaking() -> anyhow::Result<()> {
    let h = Harness::new().await?;
    h.user("alice", Role::Student).await?;
    let a = h.auth.authenticate("alice", "nope-nope").await.unwrap_err();
    let b = h.auth.authenticate("ghost", "password123").await.unwrap_err();
    assert!(matches!(a, ServiceError::InvalidCredentials));
    assert!(matches!(b, ServiceError::InvalidCredentials));
    assert_eq!(audit_count(&h, "FailedLogin").await?, 2);
    Ok(())
}

#[tokio::test]
async fn seventh_enrollment_is_rejected() -> anyhow::Result<()> {
    let h = Harness::new().await?;
    let prof = h.user("prof", Role::Instructor).await?;
    let student = h.user("stud", Role::Student).await?;
    let mut ids = Vec::new();
    for i in 0..7 {
        ids.push(h.svc.create_course(&prof, None, &format!("Course {i}"), "").await?.id);
    }
    for id in &ids[..6] {
        let e = h.svc.enroll(&student, *id).await?;
        assert_eq!(e.progress, 0.0);
    }
    let err = h.svc.enroll(&student, ids[6]).await.unwrap_err();
    assert!(matches!(err, ServiceError::EnrollmentLimitExceeded { limit: 6 }));
    assert_eq!(enrollment::count_for_user(&h.db, student.user_id).await?, 6);
    Ok(())
}

#[tokio::test]
async fn enrollment_limit_follows_policy() -> anyhow::Result<()> {
    let h = Harness::with_policy(Policy { max_enrollments: 1, ..Policy::default() }).await?;
    let prof = h.user("prof", Role::Instructor).await?;
    let student = h.user("stud", Role::Student).await?;
    let a = h.svc.create_course(&prof, None, "A", "").await?;
    let b = h.svc.create_course(&prof, None, "B", "").await?;
    h.svc.enroll(&student, a.id).await?;
    assert!(matches!(h.svc.enroll(&student, a.id).await, Err(ServiceError::AlreadyEnrolled)));
    assert!(matches!(h.svc.enroll(&student, b.id).await, Err(ServiceError::EnrollmentLimitExceeded { limit: 1 })));
    h.svc.unenroll(&student, a.id).await?;
    h.svc.enroll(&student, b.id).await?;
    Ok(())
}

#[tokio::test]
async fn concurrent_enrolls_respect_limit() -> anyhow::Result<()> {
    let h = Harness::with_policy(Policy { max_enrollments: 2, ..Policy::default() }).await?;
    let prof = h.user("prof", Role::Instructor).await?;
    let student = h.user("stud", Role::Student).await?;
    let mut ids = Vec::new();
    for i in 0..4 {
        ids.push(h.svc.create_course(&prof, None, &format!("C{i}"), "").await?.id);
    }
    let (r0, r1, r2, r3) = tokio::join!(
        h.svc.enroll(&student, ids[0]),
        h.svc.enroll(&student, ids[1]),
        h.svc.enroll(&student, ids[2]),
        h.svc.enroll(&student, ids[3]),
    );
    let results = [r0, r1, r2, r3];
    let ok = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(ok, 2);
    assert!(results.iter().filter_map(|r| r.as_ref().err()).all(|e| matches!(e, ServiceError::EnrollmentLimitExceeded { .. })));
    assert_eq!(enrollment::count_for_user(&h.db, student.user_id).await?, 2);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_enrolls_on_file_store_respect_limit() -> anyhow::Result<()> {
    let h = Arc::new(Harness::on_file(Policy { max_enrollments: 2, ..Policy::default() }).await?);
    let prof = h.user("prof", Role::Instructor).await?;
    let student = h.user("stud", Role::Student).await?;
    let mut tasks = Vec::new();
    for i in 0..6 {
        let course_id = h.svc.create_course(&prof, None, &format!("C{i}"), "").await?.id;
        let h = h.clone();
        tasks.push(tokio::spawn(async move { h.svc.enroll(&student, course_id).await }));
    }
    let mut ok = 0;
    for t in tasks {
        match t.await? {
            Ok(_) => ok += 1,
            Err(ServiceError::EnrollmentLimitExceeded { limit: 2 }) => {}
            Err(other) => panic!("unexpected enroll outcome: {other:?}"),
        }
    }
    assert_eq!(ok, 2);
    assert_eq!(enrollment::count_for_user(&h.db, student.user_id).await?, 2);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_submits_on_file_store_keep_one() -> anyhow::Result<()> {
    let h = Arc::new(Harness::on_file(Policy::default()).await?);
    let prof = h.user("prof", Role::Instructor).await?;
    let student = h.user("stud", Role::Student).await?;
    let (c, a) = course_with_assignment(&h, &prof, 7).await?;
    h.svc.enroll(&student, c.id).await?;

    let assignment_id = a.id;
    let mut tasks = Vec::new();
    for i in 0..5 {
        let h = h.clone();
        tasks.push(tokio::spawn(async move { h.svc.submit(&student, assignment_id, Some(format!("attempt {i}")), None).await }));
    }
    let mut ok = 0;
    for t in tasks {
        match t.await? {
            Ok(_) => ok += 1,
            Err(ServiceError::AlreadySubmitted) => {}
            Err(other) => panic!("unexpected submit outcome: {other:?}"),
        }
    }
    assert_eq!(ok, 1);
    assert_eq!(submission::Entity::find().count(&h.db).await?, 1);
    Ok(())
}

#[tokio::test]
async fn enrolling_requires_student_and_existing_course() -> anyhow::Result<()> {
    let h = Harness::new().await?;
    let prof = h.user("prof", Role::Instructor).await?;
    let student = h.user("stud", Role::Student).await?;
    let c = h.svc.create_course(&prof, None, "X", "").await?;
    assert!(matches!(h.svc.enroll(&prof, c.id).await, Err(ServiceError::Forbidden(_))));
    assert!(matches!(h.svc.enroll(&student, uuid::Uuid::new_v4()).await, Err(ServiceError::NotFound(_))));
    Ok(())
}

#[tokio::test]
async fn submission_after_deadline_is_rejected() -> anyhow::Result<()> {
    let h = Harness::new().await?;
    let prof = h.user("prof", Role::Instructor).await?;
    let student = h.user("stud", Role::Student).await?;
    let (c, a) = course_with_assignment(&h, &prof, 1).await?;
    h.svc.enroll(&student, c.id).await?;

    h.clock.advance(Duration::days(2));
    let err = h.svc.submit(&student, a.id, Some("late work".into()), None).await.unwrap_err();
    assert!(matches!(err, ServiceError::DeadlinePassed));
    assert_eq!(submission::Entity::find().count(&h.db).await?, 0);

    // exactly at the deadline is already too late
    h.clock.set(a.deadline);
    assert!(matches!(h.svc.submit(&student, a.id, Some("x".into()), None).await, Err(ServiceError::DeadlinePassed)));
    Ok(())
}

#[tokio::test]
async fn second_submission_conflicts() -> anyhow::Result<()> {
    let h = Harness::new().await?;
    let prof = h.user("prof", Role::Instructor).await?;
    let student = h.user("stud", Role::Student).await?;
    let (c, a) = course_with_assignment(&h, &prof, 7).await?;
    h.svc.enroll(&student, c.id).await?;

    h.svc.submit(&student, a.id, Some("first".into()), None).await?;
    let err = h.svc.submit(&student, a.id, None, Some("second.pdf".into())).await.unwrap_err();
    assert!(matches!(err, ServiceError::AlreadySubmitted));
    assert_eq!(submission::Entity::find().count(&h.db).await?, 1);
    assert_eq!(audit_count(&h, "Submission").await?, 1);
    Ok(())
}

#[tokio::test]
async fn submit_checks_enrollment_and_payload() -> anyhow::Result<()> {
    let h = Harness::new().await?;
    let prof = h.user("prof", Role::Instructor).await?;
    let student = h.user("stud", Role::Student).await?;
    let (c, a) = course_with_assignment(&h, &prof, 7).await?;
    assert!(matches!(h.svc.submit(&student, a.id, Some("x".into()), None).await, Err(ServiceError::NotEnrolled)));
    h.svc.enroll(&student, c.id).await?;
    assert!(matches!(h.svc.submit(&student, a.id, None, None).await, Err(ServiceError::Validation(_))));
    assert!(matches!(
        h.svc.submit(&student, a.id, Some("x".into()), Some("y.pdf".into())).await,
        Err(ServiceError::Validation(_))
    ));
    let s = h.svc.submit(&student, a.id, None, Some("essay.pdf".into())).await?;
    assert_eq!(s.file_name.as_deref(), Some("essay.pdf"));
    assert!(s.content.is_none());
    Ok(())
}

#[tokio::test]
async fn over_max_grade_changes_nothing() -> anyhow::Result<()> {
    let h = Harness::new().await?;
    let prof = h.user("prof", Role::Instructor).await?;
    let student = h.user("stud", Role::Student).await?;
    let (c, a) = course_with_assignment(&h, &prof, 7).await?;
    h.svc.enroll(&student, c.id).await?;
    let s = h.svc.submit(&student, a.id, Some("work".into()), None).await?;

    let err = h.svc.grade(&prof, s.id, 101.0, Some("too generous".into())).await.unwrap_err();
    assert!(matches!(err, ServiceError::ScoreOutOfRange { .. }));
    assert!(matches!(h.svc.grade(&prof, s.id, -1.0, None).await, Err(ServiceError::ScoreOutOfRange { .. })));
    let row = submission::Entity::find_by_id(s.id).one(&h.db).await?.expect("row");
    assert!(row.score.is_none());
    assert!(row.feedback.is_none());
    assert_eq!(audit_count(&h, "Grading").await?, 0);
    Ok(())
}

#[tokio::test]
async fn only_the_owner_grades_and_regrading_overwrites() -> anyhow::Result<()> {
    let h = Harness::new().await?;
    let prof = h.user("prof", Role::Instructor).await?;
    let other = h.user("other", Role::Instructor).await?;
    let student = h.user("stud", Role::Student).await?;
    let (c, a) = course_with_assignment(&h, &prof, 7).await?;
    h.svc.enroll(&student, c.id).await?;
    let s = h.svc.submit(&student, a.id, Some("work".into()), None).await?;

    assert!(matches!(h.svc.grade(&other, s.id, 50.0, None).await, Err(ServiceError::Forbidden(_))));
    h.svc.grade(&prof, s.id, 60.0, Some("ok".into())).await?;
    let again = h.svc.grade(&prof, s.id, 70.0, Some("better".into())).await?;
    assert_eq!(again.score, Some(70.0));
    assert_eq!(again.feedback.as_deref(), Some("better"));
    assert_eq!(h.svc.submission_state(&student, a.id).await?, SubmissionState::Graded);
    assert_eq!(audit_count(&h, "Grading").await?, 2);
    Ok(())
}

#[tokio::test]
async fn assignment_creation_rules() -> anyhow::Result<()> {
    let h = Harness::new().await?;
    let prof = h.user("prof", Role::Instructor).await?;
    let other = h.user("other", Role::Instructor).await?;
    let admin = h.user("root", Role::Admin).await?;
    let c = h.svc.create_course(&prof, None, "Logic", "").await?;
    let due = later(&h, Duration::days(3));

    assert!(matches!(h.svc.create_assignment(&other, c.id, "t", "", 10.0, due).await, Err(ServiceError::Forbidden(_))));
    assert!(matches!(h.svc.create_assignment(&admin, c.id, "t", "", 10.0, due).await, Err(ServiceError::Forbidden(_))));
    assert!(matches!(h.svc.create_assignment(&prof, c.id, "t", "", 0.0, due).await, Err(ServiceError::InvalidScore)));
    assert!(matches!(
        h.svc.create_assignment(&prof, c.id, "t", "", 10.0, later(&h, Duration::zero())).await,
        Err(ServiceError::InvalidDeadline)
    ));
    h.svc.create_assignment(&prof, c.id, "t", "", 10.0, due).await?;
    Ok(())
}

#[tokio::test]
async fn course_rules() -> anyhow::Result<()> {
    let h = Harness::new().await?;
    let prof = h.user("prof", Role::Instructor).await?;
    let student = h.user("stud", Role::Student).await?;
    let admin = h.user("root", Role::Admin).await?;

    assert!(matches!(h.svc.create_course(&student, None, "Nope", "").await, Err(ServiceError::Forbidden(_))));
    let c = h.svc.create_course(&prof, None, "Physics", "mechanics").await?;
    assert_eq!(c.progress, 0.0);
    let by_admin = h.svc.create_course(&admin, Some(prof.user_id), "Chemistry", "").await?;
    assert_eq!(by_admin.instructor_id, prof.user_id);
    assert!(matches!(h.svc.create_course(&admin, Some(student.user_id), "Bad", "").await, Err(ServiceError::Validation(_))));

    assert!(matches!(h.svc.update_course_progress(&prof, c.id, 1.2).await, Err(ServiceError::OutOfRange { .. })));
    assert!(matches!(h.svc.update_course_progress(&prof, c.id, -0.1).await, Err(ServiceError::OutOfRange { .. })));
    let before = c.updated_at;
    h.clock.advance(Duration::minutes(1));
    let updated = h.svc.update_course_progress(&prof, c.id, 0.5).await?;
    assert_eq!(updated.progress, 0.5);
    assert!(updated.updated_at > before);
    assert!(matches!(h.svc.update_course_progress(&student, c.id, 0.5).await, Err(ServiceError::Forbidden(_))));

    let renamed = h.svc.update_course(&admin, c.id, Some("Physics I"), None).await?;
    assert_eq!(renamed.name, "Physics I");
    assert_eq!(renamed.description, "mechanics");

    let found = h.svc.search_courses(&student, "chem").await?;
    assert_eq!(found.len(), 1);
    Ok(())
}

#[tokio::test]
async fn course_listing_is_role_scoped() -> anyhow::Result<()> {
    let h = Harness::new().await?;
    let t1 = h.user("t1", Role::Instructor).await?;
    let t2 = h.user("t2", Role::Instructor).await?;
    let student = h.user("stud", Role::Student).await?;
    let admin = h.user("root", Role::Admin).await?;
    let a = h.svc.create_course(&t1, None, "A", "").await?;
    h.svc.create_course(&t2, None, "B", "").await?;
    h.svc.enroll(&student, a.id).await?;
    h.svc.update_enrollment_progress(&t1, student.user_id, a.id, 0.25).await?;

    assert_eq!(h.svc.list_courses(&admin).await?.len(), 2);
    assert_eq!(h.svc.list_courses(&t2).await?.len(), 1);
    let mine = h.svc.list_courses(&student).await?;
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].my_progress, Some(0.25));
    let available = h.svc.available_courses(&student).await?;
    assert_eq!(available.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(), vec!["B"]);
    assert_eq!(h.svc.list_enrollments(&student).await?[0].progress, 0.25);
    assert!(matches!(
        h.svc.update_enrollment_progress(&t2, student.user_id, a.id, 0.5).await,
        Err(ServiceError::Forbidden(_))
    ));
    Ok(())
}

#[tokio::test]
async fn deleting_a_course_cascades() -> anyhow::Result<()> {
    let h = Harness::new().await?;
    let prof = h.user("prof", Role::Instructor).await?;
    let student = h.user("stud", Role::Student).await?;
    let (c, a) = course_with_assignment(&h, &prof, 7).await?;
    h.svc.enroll(&student, c.id).await?;
    h.svc.submit(&student, a.id, Some("w".into()), None).await?;

    assert!(matches!(h.svc.delete_course(&student, c.id).await, Err(ServiceError::Forbidden(_))));
    h.svc.delete_course(&prof, c.id).await?;
    assert_eq!(course::Entity::find().count(&h.db).await?, 0);
    assert_eq!(assignment::Entity::find().count(&h.db).await?, 0);
    assert_eq!(enrollment::Entity::find().count(&h.db).await?, 0);
    assert_eq!(submission::Entity::find().count(&h.db).await?, 0);
    Ok(())
}

#[tokio::test]
async fn deleting_an_instructor_removes_owned_courses_but_not_audit() -> anyhow::Result<()> {
    let h = Harness::new().await?;
    let admin = h.user("root", Role::Admin).await?;
    let prof = h.user("prof", Role::Instructor).await?;
    let student = h.user("stud", Role::Student).await?;
    let (c, a) = course_with_assignment(&h, &prof, 7).await?;
    h.svc.enroll(&student, c.id).await?;
    h.svc.submit(&student, a.id, Some("w".into()), None).await?;
    let audit_before = audit_log::Entity::find().count(&h.db).await?;

    assert!(matches!(h.svc.delete_user(&prof, student.user_id).await, Err(ServiceError::Forbidden(_))));
    assert!(matches!(h.svc.delete_user(&admin, admin.user_id).await, Err(ServiceError::Validation(_))));
    h.svc.delete_user(&admin, prof.user_id).await?;

    assert!(user::Entity::find_by_id(prof.user_id).one(&h.db).await?.is_none());
    assert_eq!(course::Entity::find().count(&h.db).await?, 0);
    assert_eq!(submission::Entity::find().count(&h.db).await?, 0);
    assert_eq!(enrollment::Entity::find().count(&h.db).await?, 0);
    assert!(audit_log::Entity::find().count(&h.db).await? > audit_before);
    Ok(())
}

#[tokio::test]
async fn user_admin_operations() -> anyhow::Result<()> {
    let h = Harness::new().await?;
    let admin = h.user("root", Role::Admin).await?;
    let alice = h.user("alice", Role::Student).await?;
    h.user("bob", Role::Student).await?;

    assert!(matches!(h.svc.list_users(&alice, Pagination::default()).await, Err(ServiceError::Forbidden(_))));
    assert_eq!(h.svc.list_users(&admin, Pagination::default()).await?.len(), 3);
    assert_eq!(h.svc.list_users(&admin, Pagination { page: 2, per_page: 2 }).await?.len(), 1);
    assert_eq!(h.svc.search_users(&admin, "ali").await?.len(), 1);

    let updated = h.svc.update_user(&admin, alice.user_id, None, Some("alice@uni.edu")).await?;
    assert_eq!(updated.email, "alice@uni.edu");
    assert_eq!(updated.role, Role::Student);
    assert!(matches!(h.svc.update_user(&admin, alice.user_id, Some("bob"), None).await, Err(ServiceError::DuplicateUsername)));
    assert!(matches!(
        h.svc.update_user(&admin, alice.user_id, None, Some("root@example.com")).await,
        Err(ServiceError::DuplicateEmail)
    ));
    assert!(matches!(h.svc.update_user(&admin, alice.user_id, None, Some("broken")).await, Err(ServiceError::InvalidEmail)));
    assert_eq!(h.svc.get_user(&alice, alice.user_id).await?.username, "alice");
    Ok(())
}

#[tokio::test]
async fn reports_and_audit_listing() -> anyhow::Result<()> {
    let h = Harness::new().await?;
    let admin = h.user("root", Role::Admin).await?;
    let prof = h.user("prof", Role::Instructor).await?;
    let student = h.user("stud", Role::Student).await?;
    let a = h.svc.create_course(&prof, None, "A", "").await?;
    let b = h.svc.create_course(&prof, None, "B", "").await?;
    h.svc.update_course_progress(&prof, a.id, 1.0).await?;
    h.svc.update_course_progress(&prof, b.id, 0.5).await?;
    h.svc.enroll(&student, a.id).await?;

    let r = h.svc.summary_report(&admin).await?;
    assert_eq!((r.students, r.instructors, r.admins, r.courses, r.enrollments), (1, 1, 1, 2, 1));
    assert!((r.average_course_progress - 0.75).abs() < 1e-9);
    assert!(matches!(h.svc.summary_report(&student).await, Err(ServiceError::Forbidden(_))));

    let recent = h.svc.recent_users(&admin, 2).await?;
    assert_eq!(recent.len(), 2);

    let logs = h.svc.list_audit_logs(&admin, Pagination { page: 1, per_page: 100 }).await?;
    assert!(logs.iter().any(|l| l.action == "Register"));
    assert!(logs.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
    assert!(matches!(h.svc.list_audit_logs(&prof, Pagination::default()).await, Err(ServiceError::Forbidden(_))));
    Ok(())
}

#[tokio::test]
async fn upcoming_and_pending_listings() -> anyhow::Result<()> {
    let h = Harness::new().await?;
    let prof = h.user("prof", Role::Instructor).await?;
    let student = h.user("stud", Role::Student).await?;
    let c = h.svc.create_course(&prof, None, "Ops", "").await?;
    let other = h.svc.create_course(&prof, None, "Elsewhere", "").await?;
    let late = h.svc.create_assignment(&prof, c.id, "late", "", 10.0, later(&h, Duration::days(9))).await?;
    let soon = h.svc.create_assignment(&prof, c.id, "soon", "", 10.0, later(&h, Duration::days(1))).await?;
    h.svc.create_assignment(&prof, c.id, "mid", "", 10.0, later(&h, Duration::days(4))).await?;
    h.svc.create_assignment(&prof, other.id, "not mine", "", 10.0, later(&h, Duration::days(2))).await?;
    h.svc.enroll(&student, c.id).await?;

    let upcoming = h.svc.list_upcoming_assignments(&student).await?;
    let titles: Vec<_> = upcoming.titles_and_deadlines().map(|(t, _)| t.to_string()).collect();
    assert_eq!(titles, vec!["soon", "mid", "late"]);
    assert_eq!(upcoming.iter().count(), 3);

    h.svc.submit(&student, late.id, Some("done early".into()), None).await?;
    let pending: Vec<_> = h.svc.pending_assignments(&student).await?.into_iter().map(|a| a.title).collect();
    assert_eq!(pending, vec!["soon", "mid"]);

    h.clock.advance(Duration::days(2));
    let after: Vec<_> = h.svc.list_upcoming_assignments(&student).await?.into_iter().map(|a| a.assignment_id).collect();
    assert!(!after.contains(&soon.id));
    assert_eq!(after.len(), 2);
    Ok(())
}

#[tokio::test]
async fn course_content_visibility() -> anyhow::Result<()> {
    let h = Harness::new().await?;
    let prof = h.user("prof", Role::Instructor).await?;
    let outsider = h.user("outsider", Role::Student).await?;
    let student = h.user("stud", Role::Student).await?;
    let (c, a) = course_with_assignment(&h, &prof, 3).await?;
    h.svc.enroll(&student, c.id).await?;

    assert_eq!(h.svc.list_course_assignments(&student, c.id).await?.len(), 1);
    assert!(matches!(h.svc.list_course_assignments(&outsider, c.id).await, Err(ServiceError::Forbidden(_))));

    h.svc.submit(&student, a.id, Some("w".into()), None).await?;
    assert_eq!(h.svc.list_course_submissions(&prof, c.id).await?.len(), 1);
    assert!(matches!(h.svc.list_course_submissions(&student, c.id).await, Err(ServiceError::Forbidden(_))));

    h.svc.delete_assignment(&prof, a.id).await?;
    assert_eq!(submission::Entity::find().count(&h.db).await?, 0);
    assert!(h.svc.list_course_assignments(&student, c.id).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn seeding_only_fills_an_empty_store() -> anyhow::Result<()> {
    let h = Harness::new().await?;
    assert!(h.svc.seed_demo_data().await?);
    assert_eq!(user::Entity::find().count(&h.db).await?, 3);
    assert_eq!(course::Entity::find().count(&h.db).await?, 2);
    let session = h.auth.authenticate("student1", "student123").await?;
    assert_eq!(session.role, Role::Student);
    assert!(!h.svc.seed_demo_data().await?);
    assert_eq!(user::Entity::find().count(&h.db).await?, 3);
    Ok(())
}

#[tokio::test]
async fn end_to_end_student_journey() -> anyhow::Result<()> {
    let h = Harness::new().await?;
    let prof = h.user("prof", Role::Instructor).await?;
    let c = h.svc.create_course(&prof, None, "C", "the course").await?;

    let alice_id = h
        .auth
        .register(crate::auth::domain::RegisterInput {
            username: "alice".into(),
            email: "alice@x.com".into(),
            password: "password123".into(),
            role: Role::Student,
        })
        .await?;
    let session = h.auth.authenticate("alice", "password123").await?;
    assert_eq!(session.user_id, alice_id);
    let alice = Caller::new(session.user_id, session.role);

    let e = h.svc.enroll(&alice, c.id).await?;
    assert_eq!(e.progress, 0.0);

    let a = h
        .svc
        .create_assignment(&prof, c.id, "A", "first assignment", 100.0, later(&h, Duration::days(7)))
        .await?;
    assert_eq!(h.svc.submission_state(&alice, a.id).await?, SubmissionState::Unsubmitted);

    let s = h.svc.submit(&alice, a.id, Some("my work".into()), None).await?;
    assert_eq!(h.svc.submission_state(&alice, a.id).await?, SubmissionState::Submitted);

    let graded = h.svc.grade(&prof, s.id, 85.0, Some("good".into())).await?;
    assert_eq!(graded.score, Some(85.0));
    assert_eq!(h.svc.submission_state(&alice, a.id).await?, SubmissionState::Graded);

    let upcoming = h.svc.list_upcoming_assignments(&alice).await?;
    assert!(upcoming.iter().any(|u| u.assignment_id == a.id));

    let scores = h.svc.my_submissions(&alice).await?;
    assert_eq!(scores.len(), 1);
    assert_eq!(scores[0].score, Some(85.0));
    assert_eq!(scores[0].feedback.as_deref(), Some("good"));
    assert_eq!(scores[0].state, SubmissionState::Graded);

    for label in ["Register", "Login", "Submission", "Grading"] {
        assert!(audit_count(&h, label).await? >= 1, "missing audit entry {label}");
    }
    Ok(())
}
