use std::collections::HashSet;

use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder, Set, TransactionTrait};
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

use models::submission::Payload;
use models::{assignment, enrollment, submission, DateTimeWithTimeZone};

use super::assignments::UpcomingAssignments;
use super::{load_course, AcademicService};
use crate::audit::AuditAction;
use crate::context::Caller;
use crate::errors::ServiceError;
use crate::storage::conflict_or_storage;

/// Unsubmitted -> Submitted -> Graded; nothing leaves Graded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionState {
    Unsubmitted,
    Submitted,
    Graded,
}

impl SubmissionState {
    pub fn of(row: Option<&submission::Model>) -> Self {
        match row {
            None => SubmissionState::Unsubmitted,
            Some(s) if s.is_graded() => SubmissionState::Graded,
            Some(_) => SubmissionState::Submitted,
        }
    }
}

/// A student's own submission with its grade, if any.
#[derive(Debug, Clone, Serialize)]
pub struct MySubmission {
    pub submission_id: Uuid,
    pub assignment_id: Uuid,
    pub assignment_title: String,
    pub course_id: Uuid,
    pub max_score: f64,
    pub score: Option<f64>,
    pub feedback: Option<String>,
    pub state: SubmissionState,
    pub submitted_at: DateTimeWithTimeZone,
}

async fn load_assignment<C: sea_orm::ConnectionTrait>(db: &C, id: Uuid) -> Result<assignment::Model, ServiceError> {
    assignment::Entity::find_by_id(id).one(db).await?.ok_or_else(|| ServiceError::not_found("assignment"))
}

impl AcademicService {
    /// Hand in work for an assignment. Exactly one of `content` / `file_name`.
    #[instrument(skip(self, content, file_name), fields(caller = %caller.user_id))]
    pub async fn submit(
        &self,
        caller: &Caller,
        assignment_id: Uuid,
        content: Option<String>,
        file_name: Option<String>,
    ) -> Result<submission::Model, ServiceError> {
        caller.require_student()?;
        let payload = Payload::from_parts(content, file_name)?;
        let created = self
            .run("submit", async {
                let txn = self.db.begin().await?;
                let a = load_assignment(&txn, assignment_id).await?;
                if enrollment::find(&txn, caller.user_id, a.course_id).await?.is_none() {
                    return Err(ServiceError::NotEnrolled);
                }
                let now = self.now();
                if now >= a.deadline {
                    return Err(ServiceError::DeadlinePassed);
                }
                if submission::find_for_pair(&txn, assignment_id, caller.user_id).await?.is_some() {
                    return Err(ServiceError::AlreadySubmitted);
                }
                let created = match submission::create(&txn, assignment_id, caller.user_id, payload, now).await {
                    Ok(s) => s,
                    Err(models::errors::ModelError::Db(e)) => {
                        return Err(conflict_or_storage(e, |_| ServiceError::AlreadySubmitted))
                    }
                    Err(e) => return Err(e.into()),
                };
                txn.commit().await?;
                Ok(created)
            })
            .await?;
        info!(submission_id = %created.id, assignment_id = %assignment_id, "assignment_submitted");
        self.audit(caller.user_id, AuditAction::Submission, format!("submission={} assignment={}", created.id, assignment_id))
            .await;
        Ok(created)
    }

    /// Set score and feedback. Re-grading overwrites; a rejected grade leaves
    /// the row untouched.
    #[instrument(skip(self, feedback), fields(caller = %caller.user_id))]
    pub async fn grade(
        &self,
        caller: &Caller,
        submission_id: Uuid,
        score: f64,
        feedback: Option<String>,
    ) -> Result<submission::Model, ServiceError> {
        let graded = self
            .run("grade", async {
                let s = submission::Entity::find_by_id(submission_id)
                    .one(&self.db)
                    .await?
                    .ok_or_else(|| ServiceError::not_found("submission"))?;
                let a = load_assignment(&self.db, s.assignment_id).await?;
                let c = load_course(&self.db, a.course_id).await?;
                caller.require_owner(c.instructor_id)?;
                if !score.is_finite() || score < 0.0 || score > a.max_score {
                    return Err(ServiceError::ScoreOutOfRange { max: a.max_score });
                }
                let mut am = s.into_active_model();
                am.score = Set(Some(score));
                am.feedback = Set(feedback.filter(|f| !f.trim().is_empty()));
                am.graded_at = Set(Some(self.now()));
                Ok(am.update(&self.db).await?)
            })
            .await?;
        info!(submission_id = %submission_id, score, "submission_graded");
        self.audit(caller.user_id, AuditAction::Grading, format!("submission={submission_id} score={score}")).await;
        Ok(graded)
    }

    /// Upcoming assignments the student has not handed in yet.
    pub async fn pending_assignments(&self, caller: &Caller) -> Result<UpcomingAssignments, ServiceError> {
        caller.require_student()?;
        self.run("pending_assignments", async {
            let upcoming = self.upcoming_for(caller.user_id).await?;
            if upcoming.is_empty() {
                return Ok(upcoming);
            }
            let ids: Vec<Uuid> = upcoming.iter().map(|a| a.assignment_id).collect();
            let done: HashSet<Uuid> = submission::Entity::find()
                .filter(submission::Column::StudentId.eq(caller.user_id))
                .filter(submission::Column::AssignmentId.is_in(ids))
                .all(&self.db)
                .await?
                .into_iter()
                .map(|s| s.assignment_id)
                .collect();
            Ok(upcoming.retain(|a| !done.contains(&a.assignment_id)))
        })
        .await
    }

    pub async fn submission_state(&self, caller: &Caller, assignment_id: Uuid) -> Result<SubmissionState, ServiceError> {
        caller.require_student()?;
        self.run("submission_state", async {
            load_assignment(&self.db, assignment_id).await?;
            let row = submission::find_for_pair(&self.db, assignment_id, caller.user_id).await?;
            Ok(SubmissionState::of(row.as_ref()))
        })
        .await
    }

    /// Grading view: every submission for the course's assignments.
    pub async fn list_course_submissions(&self, caller: &Caller, course_id: Uuid) -> Result<Vec<submission::Model>, ServiceError> {
        self.run("list_course_submissions", async {
            let c = load_course(&self.db, course_id).await?;
            caller.require_owner_or_admin(c.instructor_id)?;
            let ids: Vec<Uuid> = assignment::Entity::find()
                .filter(assignment::Column::CourseId.eq(course_id))
                .all(&self.db)
                .await?
                .into_iter()
                .map(|a| a.id)
                .collect();
            if ids.is_empty() {
                return Ok(Vec::new());
            }
            Ok(submission::Entity::find()
                .filter(submission::Column::AssignmentId.is_in(ids))
                .order_by_asc(submission::Column::SubmittedAt)
                .all(&self.db)
                .await?)
        })
        .await
    }

    pub async fn my_submissions(&self, caller: &Caller) -> Result<Vec<MySubmission>, ServiceError> {
        caller.require_student()?;
        self.run("my_submissions", async {
            let rows = submission::Entity::find()
                .filter(submission::Column::StudentId.eq(caller.user_id))
                .order_by_desc(submission::Column::SubmittedAt)
                .find_also_related(assignment::Entity)
                .all(&self.db)
                .await?;
            Ok(rows
                .into_iter()
                .filter_map(|(s, a)| {
                    let a = a?;
                    Some(MySubmission {
                        submission_id: s.id,
                        assignment_id: a.id,
                        assignment_title: a.title,
                        course_id: a.course_id,
                        max_score: a.max_score,
                        score: s.score,
                        state: SubmissionState::of(Some(&s)),
                        feedback: s.feedback,
                        submitted_at: s.submitted_at,
                    })
                })
                .collect())
        })
        .await
    }
}
