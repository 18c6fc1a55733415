use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, TransactionTrait};
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

use models::user::Role;
use models::{assignment, enrollment, submission, DateTimeWithTimeZone};

use super::{load_course, AcademicService};
use crate::audit::AuditAction;
use crate::context::Caller;
use crate::errors::ServiceError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpcomingAssignment {
    pub assignment_id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub deadline: DateTimeWithTimeZone,
}

/// Finite, deadline-ordered listing; iterate it as many times as needed.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct UpcomingAssignments(Vec<UpcomingAssignment>);

impl UpcomingAssignments {
    fn from_unsorted(mut items: Vec<UpcomingAssignment>) -> Self {
        items.sort_by(|a, b| a.deadline.cmp(&b.deadline).then_with(|| a.title.cmp(&b.title)));
        Self(items)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, UpcomingAssignment> { self.0.iter() }

    pub fn len(&self) -> usize { self.0.len() }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    /// (title, deadline) pairs in order.
    pub fn titles_and_deadlines(&self) -> impl Iterator<Item = (&str, DateTimeWithTimeZone)> + '_ {
        self.0.iter().map(|a| (a.title.as_str(), a.deadline))
    }

    pub(crate) fn retain(mut self, keep: impl Fn(&UpcomingAssignment) -> bool) -> Self {
        self.0.retain(|a| keep(a));
        self
    }
}

impl<'a> IntoIterator for &'a UpcomingAssignments {
    type Item = &'a UpcomingAssignment;
    type IntoIter = std::slice::Iter<'a, UpcomingAssignment>;
    fn into_iter(self) -> Self::IntoIter { self.0.iter() }
}

impl IntoIterator for UpcomingAssignments {
    type Item = UpcomingAssignment;
    type IntoIter = std::vec::IntoIter<UpcomingAssignment>;
    fn into_iter(self) -> Self::IntoIter { self.0.into_iter() }
}

impl AcademicService {
    /// Only the owning instructor may add assignments to a course.
    #[instrument(skip(self, description), fields(caller = %caller.user_id))]
    pub async fn create_assignment(
        &self,
        caller: &Caller,
        course_id: Uuid,
        title: &str,
        description: &str,
        max_score: f64,
        deadline: DateTimeWithTimeZone,
    ) -> Result<assignment::Model, ServiceError> {
        let created = self
            .run("create_assignment", async {
                let c = load_course(&self.db, course_id).await?;
                caller.require_owner(c.instructor_id)?;
                if !max_score.is_finite() || max_score <= 0.0 {
                    return Err(ServiceError::InvalidScore);
                }
                let now = self.now();
                if deadline <= now {
                    return Err(ServiceError::InvalidDeadline);
                }
                Ok(assignment::create(&self.db, course_id, title, description, max_score, deadline.with_timezone(&chrono::Utc).fixed_offset(), now).await?)
            })
            .await?;
        info!(assignment_id = %created.id, course_id = %course_id, "assignment_created");
        self.audit(caller.user_id, AuditAction::CreateAssignment, format!("assignment={} course={}", created.id, course_id)).await;
        Ok(created)
    }

    /// Course content ordered by deadline: admin, owner and enrolled students only.
    pub async fn list_course_assignments(&self, caller: &Caller, course_id: Uuid) -> Result<Vec<assignment::Model>, ServiceError> {
        self.run("list_course_assignments", async {
            let c = load_course(&self.db, course_id).await?;
            let allowed = match caller.role {
                Role::Admin => true,
                Role::Instructor => c.instructor_id == caller.user_id,
                Role::Student => enrollment::find(&self.db, caller.user_id, course_id).await?.is_some(),
            };
            if !allowed {
                return Err(ServiceError::forbidden("no access to this course"));
            }
            let mut rows = assignment::Entity::find()
                .filter(assignment::Column::CourseId.eq(course_id))
                .all(&self.db)
                .await?;
            rows.sort_by(|a, b| a.deadline.cmp(&b.deadline));
            Ok(rows)
        })
        .await
    }

    /// Removes the assignment and its submissions atomically.
    #[instrument(skip(self), fields(caller = %caller.user_id))]
    pub async fn delete_assignment(&self, caller: &Caller, id: Uuid) -> Result<(), ServiceError> {
        self.run("delete_assignment", async {
            let txn = self.db.begin().await?;
            let a = assignment::Entity::find_by_id(id)
                .one(&txn)
                .await?
                .ok_or_else(|| ServiceError::not_found("assignment"))?;
            let c = load_course(&txn, a.course_id).await?;
            caller.require_owner_or_admin(c.instructor_id)?;
            submission::Entity::delete_many().filter(submission::Column::AssignmentId.eq(id)).exec(&txn).await?;
            assignment::Entity::delete_by_id(id).exec(&txn).await?;
            txn.commit().await?;
            Ok(())
        })
        .await?;
        self.audit(caller.user_id, AuditAction::DeleteAssignment, format!("assignment={id}")).await;
        Ok(())
    }

    /// Assignments still open in the student's courses, earliest deadline first.
    ///
    /// Graded or submitted work keeps appearing until its deadline passes.
    pub async fn list_upcoming_assignments(&self, caller: &Caller) -> Result<UpcomingAssignments, ServiceError> {
        caller.require_student()?;
        self.run("list_upcoming_assignments", self.upcoming_for(caller.user_id)).await
    }

    pub(crate) async fn upcoming_for(&self, student_id: Uuid) -> Result<UpcomingAssignments, ServiceError> {
        let course_ids: Vec<Uuid> = enrollment::Entity::find()
            .filter(enrollment::Column::UserId.eq(student_id))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|e| e.course_id)
            .collect();
        if course_ids.is_empty() {
            return Ok(UpcomingAssignments::default());
        }
        let now = self.now();
        let open = assignment::Entity::find()
            .filter(assignment::Column::CourseId.is_in(course_ids))
            .all(&self.db)
            .await?
            .into_iter()
            .filter(|a| a.deadline > now)
            .map(|a| UpcomingAssignment { assignment_id: a.id, course_id: a.course_id, title: a.title, deadline: a.deadline })
            .collect();
        Ok(UpcomingAssignments::from_unsorted(open))
    }
}
