use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

use models::user::Role;
use models::{assignment, course, enrollment, submission, DateTimeWithTimeZone};

use super::{load_course, load_user, AcademicService};
use crate::audit::AuditAction;
use crate::context::Caller;
use crate::errors::ServiceError;

/// A course as seen by a particular caller; students also see their own progress.
#[derive(Debug, Clone, Serialize)]
pub struct CourseView {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub instructor_id: Uuid,
    pub progress: f64,
    pub my_progress: Option<f64>,
    pub updated_at: DateTimeWithTimeZone,
}

impl CourseView {
    fn of(c: course::Model, my_progress: Option<f64>) -> Self {
        Self {
            id: c.id,
            name: c.name,
            description: c.description,
            instructor_id: c.instructor_id,
            progress: c.progress,
            my_progress,
            updated_at: c.updated_at,
        }
    }
}

/// Remove a course with everything hanging off it. Callers run this inside a transaction.
pub(crate) async fn cascade_delete_course<C: ConnectionTrait>(db: &C, course_id: Uuid) -> Result<(), ServiceError> {
    let assignment_ids: Vec<Uuid> = assignment::Entity::find()
        .filter(assignment::Column::CourseId.eq(course_id))
        .all(db)
        .await?
        .into_iter()
        .map(|a| a.id)
        .collect();
    if !assignment_ids.is_empty() {
        submission::Entity::delete_many()
            .filter(submission::Column::AssignmentId.is_in(assignment_ids))
            .exec(db)
            .await?;
    }
    assignment::Entity::delete_many().filter(assignment::Column::CourseId.eq(course_id)).exec(db).await?;
    enrollment::Entity::delete_many().filter(enrollment::Column::CourseId.eq(course_id)).exec(db).await?;
    course::Entity::delete_by_id(course_id).exec(db).await?;
    Ok(())
}

impl AcademicService {
    /// Instructors create courses they own; admins create them on behalf of an
    /// instructor named by `instructor_id`.
    #[instrument(skip(self, description), fields(caller = %caller.user_id))]
    pub async fn create_course(
        &self,
        caller: &Caller,
        instructor_id: Option<Uuid>,
        name: &str,
        description: &str,
    ) -> Result<course::Model, ServiceError> {
        caller.require_staff()?;
        course::validate_name(name)?;
        let created = self
            .run("create_course", async {
                let owner = match (caller.role, instructor_id) {
                    (Role::Instructor, None) => caller.user_id,
                    (Role::Instructor, Some(id)) if id == caller.user_id => id,
                    (Role::Instructor, Some(_)) => {
                        return Err(ServiceError::forbidden("instructors create their own courses"))
                    }
                    (_, Some(id)) => id,
                    (_, None) => return Err(ServiceError::Validation("instructor_id required".into())),
                };
                if load_user(&self.db, owner).await?.role != Role::Instructor {
                    return Err(ServiceError::Validation("course owner must be an instructor".into()));
                }
                Ok(course::create(&self.db, owner, name, description).await?)
            })
            .await?;
        info!(course_id = %created.id, "course_created");
        self.audit(caller.user_id, AuditAction::CreateCourse, format!("course={} name={}", created.id, created.name)).await;
        Ok(created)
    }

    /// Admin sees every course, an instructor the owned ones, a student the
    /// enrolled ones together with their own progress.
    pub async fn list_courses(&self, caller: &Caller) -> Result<Vec<CourseView>, ServiceError> {
        self.run("list_courses", async {
            match caller.role {
                Role::Admin => {
                    let all = course::Entity::find().order_by_asc(course::Column::Name).all(&self.db).await?;
                    Ok(all.into_iter().map(|c| CourseView::of(c, None)).collect())
                }
                Role::Instructor => {
                    let owned = course::Entity::find()
                        .filter(course::Column::InstructorId.eq(caller.user_id))
                        .order_by_asc(course::Column::Name)
                        .all(&self.db)
                        .await?;
                    Ok(owned.into_iter().map(|c| CourseView::of(c, None)).collect())
                }
                Role::Student => {
                    let rows = enrollment::Entity::find()
                        .filter(enrollment::Column::UserId.eq(caller.user_id))
                        .find_also_related(course::Entity)
                        .all(&self.db)
                        .await?;
                    let mut views: Vec<CourseView> = rows
                        .into_iter()
                        .filter_map(|(e, c)| c.map(|c| CourseView::of(c, Some(e.progress))))
                        .collect();
                    views.sort_by(|a, b| a.name.cmp(&b.name));
                    Ok(views)
                }
            }
        })
        .await
    }

    /// Substring match on name or description.
    pub async fn search_courses(&self, _caller: &Caller, term: &str) -> Result<Vec<course::Model>, ServiceError> {
        let term = term.trim().to_string();
        self.run("search_courses", async {
            let mut q = course::Entity::find();
            if !term.is_empty() {
                q = q.filter(
                    Condition::any()
                        .add(course::Column::Name.contains(term.as_str()))
                        .add(course::Column::Description.contains(term.as_str())),
                );
            }
            Ok(q.order_by_asc(course::Column::Name).all(&self.db).await?)
        })
        .await
    }

    pub async fn get_course(&self, _caller: &Caller, id: Uuid) -> Result<course::Model, ServiceError> {
        self.run("get_course", load_course(&self.db, id)).await
    }

    #[instrument(skip(self, name, description), fields(caller = %caller.user_id))]
    pub async fn update_course(
        &self,
        caller: &Caller,
        id: Uuid,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<course::Model, ServiceError> {
        if let Some(n) = name {
            course::validate_name(n)?;
        }
        self.run("update_course", async {
            let c = load_course(&self.db, id).await?;
            caller.require_owner_or_admin(c.instructor_id)?;
            let mut am = c.into_active_model();
            if let Some(n) = name {
                am.name = Set(n.trim().to_string());
            }
            if let Some(d) = description {
                am.description = Set(d.to_string());
            }
            am.updated_at = Set(self.now());
            Ok(am.update(&self.db).await?)
        })
        .await
    }

    /// Overwrite a course's progress fraction.
    #[instrument(skip(self), fields(caller = %caller.user_id))]
    pub async fn update_course_progress(&self, caller: &Caller, id: Uuid, progress: f64) -> Result<course::Model, ServiceError> {
        if !course::progress_in_range(progress) {
            return Err(ServiceError::OutOfRange { what: "progress" });
        }
        self.run("update_course_progress", async {
            let c = load_course(&self.db, id).await?;
            caller.require_owner_or_admin(c.instructor_id)?;
            let mut am = c.into_active_model();
            am.progress = Set(progress);
            am.updated_at = Set(self.now());
            Ok(am.update(&self.db).await?)
        })
        .await
    }

    /// Deletes the course, its enrollments, assignments and their submissions atomically.
    #[instrument(skip(self), fields(caller = %caller.user_id))]
    pub async fn delete_course(&self, caller: &Caller, id: Uuid) -> Result<(), ServiceError> {
        caller.require_staff()?;
        self.run("delete_course", async {
            let txn = self.db.begin().await?;
            let c = load_course(&txn, id).await?;
            caller.require_owner_or_admin(c.instructor_id)?;
            cascade_delete_course(&txn, id).await?;
            txn.commit().await?;
            Ok(())
        })
        .await?;
        info!(course_id = %id, "course_deleted");
        self.audit(caller.user_id, AuditAction::DeleteCourse, format!("course={id}")).await;
        Ok(())
    }

    /// Courses the student is not yet enrolled in.
    pub async fn available_courses(&self, caller: &Caller) -> Result<Vec<course::Model>, ServiceError> {
        caller.require_student()?;
        self.run("available_courses", async {
            let enrolled: Vec<Uuid> = enrollment::Entity::find()
                .filter(enrollment::Column::UserId.eq(caller.user_id))
                .all(&self.db)
                .await?
                .into_iter()
                .map(|e| e.course_id)
                .collect();
            let mut q = course::Entity::find();
            if !enrolled.is_empty() {
                q = q.filter(course::Column::Id.is_not_in(enrolled));
            }
            Ok(q.order_by_asc(course::Column::Name).all(&self.db).await?)
        })
        .await
    }
}
