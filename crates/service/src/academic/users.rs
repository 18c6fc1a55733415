use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use tracing::{info, instrument};
use uuid::Uuid;

use models::user::{self, Role};
use models::{course, enrollment, submission};

use super::courses::cascade_delete_course;
use super::{load_user, AcademicService};
use crate::audit::AuditAction;
use crate::auth::repo::seaorm::duplicate_user_error;
use crate::context::Caller;
use crate::errors::ServiceError;
use crate::pagination::Pagination;
use crate::storage::conflict_or_storage;

impl AcademicService {
    pub async fn list_users(&self, caller: &Caller, page: Pagination) -> Result<Vec<user::Model>, ServiceError> {
        caller.require_admin()?;
        self.run("list_users", async {
            Ok(page.fetch(&self.db, user::Entity::find().order_by_asc(user::Column::Username)).await?)
        })
        .await
    }

    /// Substring match on username or email.
    pub async fn search_users(&self, caller: &Caller, term: &str) -> Result<Vec<user::Model>, ServiceError> {
        caller.require_admin()?;
        let term = term.trim().to_string();
        self.run("search_users", async {
            let mut q = user::Entity::find();
            if !term.is_empty() {
                q = q.filter(
                    Condition::any()
                        .add(user::Column::Username.contains(term.as_str()))
                        .add(user::Column::Email.contains(term.as_str())),
                );
            }
            Ok(q.order_by_asc(user::Column::Username).all(&self.db).await?)
        })
        .await
    }

    pub async fn get_user(&self, caller: &Caller, id: Uuid) -> Result<user::Model, ServiceError> {
        if !caller.is_admin() && caller.user_id != id {
            return Err(ServiceError::forbidden("admin role required"));
        }
        self.run("get_user", load_user(&self.db, id)).await
    }

    /// Change username and/or email. The role is fixed at creation.
    #[instrument(skip(self, username, email), fields(caller = %caller.user_id))]
    pub async fn update_user(
        &self,
        caller: &Caller,
        id: Uuid,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<user::Model, ServiceError> {
        caller.require_admin()?;
        if let Some(u) = username {
            user::validate_username(u)?;
        }
        if let Some(e) = email {
            user::validate_email(e).map_err(|_| ServiceError::InvalidEmail)?;
        }
        let updated = self
            .run("update_user", async {
                let existing = load_user(&self.db, id).await?;
                let mut am = existing.into_active_model();
                if let Some(u) = username {
                    am.username = Set(u.trim().to_string());
                }
                if let Some(e) = email {
                    am.email = Set(e.trim().to_string());
                }
                am.updated_at = Set(self.now());
                am.update(&self.db).await.map_err(|e| conflict_or_storage(e, duplicate_user_error))
            })
            .await?;
        self.audit(caller.user_id, AuditAction::UpdateUser, format!("user={id}")).await;
        Ok(updated)
    }

    /// Removes the user together with their submissions, enrollments and, for
    /// instructors, every owned course with its content. Audit rows stay.
    #[instrument(skip(self), fields(caller = %caller.user_id))]
    pub async fn delete_user(&self, caller: &Caller, id: Uuid) -> Result<(), ServiceError> {
        caller.require_admin()?;
        if caller.user_id == id {
            return Err(ServiceError::Validation("cannot delete your own account".into()));
        }
        let removed = self
            .run("delete_user", async {
                let txn = self.db.begin().await?;
                let target = load_user(&txn, id).await?;
                if target.role == Role::Instructor {
                    let owned: Vec<Uuid> = course::Entity::find()
                        .filter(course::Column::InstructorId.eq(id))
                        .all(&txn)
                        .await?
                        .into_iter()
                        .map(|c| c.id)
                        .collect();
                    for course_id in owned {
                        cascade_delete_course(&txn, course_id).await?;
                    }
                }
                submission::Entity::delete_many().filter(submission::Column::StudentId.eq(id)).exec(&txn).await?;
                enrollment::Entity::delete_many().filter(enrollment::Column::UserId.eq(id)).exec(&txn).await?;
                user::Entity::delete_by_id(id).exec(&txn).await?;
                txn.commit().await?;
                Ok(target)
            })
            .await?;
        info!(user_id = %id, role = %removed.role, "user_deleted");
        self.audit(caller.user_id, AuditAction::DeleteUser, format!("user={} username={}", id, removed.username)).await;
        Ok(())
    }
}
