use sea_orm::sea_query::{Expr, Func, SimpleExpr};
use sea_orm::{ColumnTrait, EntityTrait, FromQueryResult, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect};
use serde::Serialize;

use models::user::{self, Role};
use models::{audit_log, course, enrollment, submission};

use super::AcademicService;
use crate::context::Caller;
use crate::errors::ServiceError;
use crate::pagination::Pagination;

/// Admin dashboard figures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryReport {
    pub students: u64,
    pub instructors: u64,
    pub admins: u64,
    pub courses: u64,
    pub enrollments: u64,
    pub submissions: u64,
    pub average_course_progress: f64,
}

#[derive(Debug, FromQueryResult)]
struct AvgRow {
    avg: Option<f64>,
}

impl AcademicService {
    pub async fn summary_report(&self, caller: &Caller) -> Result<SummaryReport, ServiceError> {
        caller.require_admin()?;
        self.run("summary_report", async {
            let count_role = |role: Role| user::Entity::find().filter(user::Column::Role.eq(role)).count(&self.db);
            let students = count_role(Role::Student).await?;
            let instructors = count_role(Role::Instructor).await?;
            let admins = count_role(Role::Admin).await?;
            let courses = course::Entity::find().count(&self.db).await?;
            let enrollments = enrollment::Entity::find().count(&self.db).await?;
            let submissions = submission::Entity::find().count(&self.db).await?;
            let avg = course::Entity::find()
                .select_only()
                .column_as(SimpleExpr::from(Func::avg(Expr::col(course::Column::Progress))), "avg")
                .into_model::<AvgRow>()
                .one(&self.db)
                .await?
                .and_then(|r| r.avg)
                .unwrap_or(0.0);
            Ok(SummaryReport { students, instructors, admins, courses, enrollments, submissions, average_course_progress: avg })
        })
        .await
    }

    /// Most recently created accounts first.
    pub async fn recent_users(&self, caller: &Caller, limit: u64) -> Result<Vec<user::Model>, ServiceError> {
        caller.require_admin()?;
        let limit = limit.clamp(1, 100);
        self.run("recent_users", async {
            Ok(user::Entity::find()
                .order_by_desc(user::Column::CreatedAt)
                .limit(limit)
                .all(&self.db)
                .await?)
        })
        .await
    }

    pub async fn list_audit_logs(&self, caller: &Caller, page: Pagination) -> Result<Vec<audit_log::Model>, ServiceError> {
        self.run("list_audit_logs", crate::audit::list_audit_logs(&self.db, caller, page)).await
    }
}
