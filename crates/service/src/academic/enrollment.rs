use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter, Set, TransactionTrait};
use serde::Serialize;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use models::user::Role;
use models::{course, enrollment, DateTimeWithTimeZone};

use super::{load_course, lock_user, AcademicService};
use crate::audit::AuditAction;
use crate::context::Caller;
use crate::errors::ServiceError;
use crate::storage::conflict_or_storage;

#[derive(Debug, Clone, Serialize)]
pub struct EnrolledCourse {
    pub course_id: Uuid,
    pub course_name: String,
    pub progress: f64,
    pub enrolled_at: DateTimeWithTimeZone,
}

impl AcademicService {
    /// Enroll the calling student, holding the limit under concurrent callers.
    ///
    /// The count check and the insert share one transaction; the student's
    /// row is locked first on backends with row locks, and the composite key
    /// turns a lost race on the same pair into `AlreadyEnrolled`.
    #[instrument(skip(self), fields(caller = %caller.user_id))]
    pub async fn enroll(&self, caller: &Caller, course_id: Uuid) -> Result<enrollment::Model, ServiceError> {
        caller.require_student()?;
        let limit = self.policy.max_enrollments;
        let created = self
            .run("enroll", async {
                let txn = self.db.begin().await?;
                let student = lock_user(&txn, caller.user_id).await?;
                if student.role != Role::Student {
                    return Err(ServiceError::forbidden("only students enroll"));
                }
                load_course(&txn, course_id).await?;
                if enrollment::find(&txn, caller.user_id, course_id).await?.is_some() {
                    return Err(ServiceError::AlreadyEnrolled);
                }
                let held = enrollment::count_for_user(&txn, caller.user_id).await?;
                if held >= limit {
                    debug!(held, limit, "enrollment limit reached");
                    return Err(ServiceError::EnrollmentLimitExceeded { limit });
                }
                let created = match enrollment::create(&txn, caller.user_id, course_id).await {
                    Ok(e) => e,
                    Err(models::errors::ModelError::Db(e)) => {
                        return Err(conflict_or_storage(e, |_| ServiceError::AlreadyEnrolled))
                    }
                    Err(e) => return Err(e.into()),
                };
                txn.commit().await?;
                Ok(created)
            })
            .await?;
        info!(course_id = %course_id, "student_enrolled");
        self.audit(caller.user_id, AuditAction::Enroll, format!("course={course_id}")).await;
        Ok(created)
    }

    /// Drops the enrollment row only; submissions stay for the record.
    #[instrument(skip(self), fields(caller = %caller.user_id))]
    pub async fn unenroll(&self, caller: &Caller, course_id: Uuid) -> Result<(), ServiceError> {
        caller.require_student()?;
        self.run("unenroll", async {
            let res = enrollment::Entity::delete_by_id((caller.user_id, course_id)).exec(&self.db).await?;
            if res.rows_affected == 0 {
                return Err(ServiceError::not_found("enrollment"));
            }
            Ok(())
        })
        .await?;
        self.audit(caller.user_id, AuditAction::Unenroll, format!("course={course_id}")).await;
        Ok(())
    }

    /// Per-student progress, set by the course owner or an admin.
    pub async fn update_enrollment_progress(
        &self,
        caller: &Caller,
        student_id: Uuid,
        course_id: Uuid,
        progress: f64,
    ) -> Result<enrollment::Model, ServiceError> {
        if !course::progress_in_range(progress) {
            return Err(ServiceError::OutOfRange { what: "progress" });
        }
        self.run("update_enrollment_progress", async {
            let c = load_course(&self.db, course_id).await?;
            caller.require_owner_or_admin(c.instructor_id)?;
            let e = enrollment::find(&self.db, student_id, course_id)
                .await?
                .ok_or_else(|| ServiceError::not_found("enrollment"))?;
            let mut am = e.into_active_model();
            am.progress = Set(progress);
            Ok(am.update(&self.db).await?)
        })
        .await
    }

    pub async fn list_enrollments(&self, caller: &Caller) -> Result<Vec<EnrolledCourse>, ServiceError> {
        caller.require_student()?;
        self.run("list_enrollments", async {
            let rows = enrollment::Entity::find()
                .filter(enrollment::Column::UserId.eq(caller.user_id))
                .find_also_related(course::Entity)
                .all(&self.db)
                .await?;
            let mut out: Vec<EnrolledCourse> = rows
                .into_iter()
                .filter_map(|(e, c)| {
                    c.map(|c| EnrolledCourse { course_id: c.id, course_name: c.name, progress: e.progress, enrolled_at: e.created_at })
                })
                .collect();
            out.sort_by(|a, b| a.course_name.cmp(&b.course_name));
            Ok(out)
        })
        .await
    }
}
