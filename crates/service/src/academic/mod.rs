//! The academic records service: courses, assignments, enrollment,
//! submissions, grading, user administration and reporting.
//!
//! Every operation takes the caller explicitly and runs inside
//! [`crate::storage::bounded`], so storage stalls surface as
//! `StorageUnavailable` instead of hanging the caller.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use sea_orm::{ConnectionTrait, DatabaseConnection, DbBackend, EntityTrait, QuerySelect};
use uuid::Uuid;

use models::{course, user, DateTimeWithTimeZone};

use crate::audit::{self, AuditAction, AuditEntry, AuditSink};
use crate::clock::Clock;
use crate::errors::ServiceError;
use crate::storage::bounded;

pub mod assignments;
pub mod courses;
pub mod enrollment;
pub mod reports;
pub mod seed;
pub mod submissions;
pub mod users;

#[cfg(test)]
mod tests;

pub use assignments::{UpcomingAssignment, UpcomingAssignments};
pub use courses::CourseView;
pub use enrollment::EnrolledCourse;
pub use reports::SummaryReport;
pub use submissions::{MySubmission, SubmissionState};

/// Business limits applied by the service.
#[derive(Debug, Clone)]
pub struct Policy {
    pub max_enrollments: u64,
    pub min_password_len: usize,
    pub storage_timeout: Duration,
}

impl Policy {
    pub fn from_config(p: &configs::PolicyConfig) -> Self {
        Self {
            max_enrollments: p.max_enrollments,
            min_password_len: p.min_password_len,
            storage_timeout: Duration::from_millis(p.storage_timeout_ms),
        }
    }
}

impl Default for Policy {
    fn default() -> Self { Self::from_config(&configs::PolicyConfig::default()) }
}

pub struct AcademicService {
    db: DatabaseConnection,
    policy: Policy,
    clock: Arc<dyn Clock>,
    audit: Arc<dyn AuditSink>,
}

impl AcademicService {
    pub fn new(db: DatabaseConnection, policy: Policy, clock: Arc<dyn Clock>, audit: Arc<dyn AuditSink>) -> Self {
        Self { db, policy, clock, audit }
    }

    pub fn db(&self) -> &DatabaseConnection { &self.db }

    pub fn policy(&self) -> &Policy { &self.policy }

    pub(crate) fn now(&self) -> DateTimeWithTimeZone { self.clock.now() }

    pub(crate) async fn run<T, F>(&self, operation: &'static str, fut: F) -> Result<T, ServiceError>
    where
        F: Future<Output = Result<T, ServiceError>>,
    {
        bounded(operation, self.policy.storage_timeout, fut).await
    }

    pub(crate) async fn audit(&self, user_id: Uuid, action: AuditAction, details: String) {
        audit::record(self.audit.as_ref(), AuditEntry::new(Some(user_id), action, details, self.now())).await;
    }
}

pub(crate) async fn load_course<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<course::Model, ServiceError> {
    course::Entity::find_by_id(id).one(db).await?.ok_or_else(|| ServiceError::not_found("course"))
}

pub(crate) async fn load_user<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<user::Model, ServiceError> {
    user::Entity::find_by_id(id).one(db).await?.ok_or_else(|| ServiceError::not_found("user"))
}

/// Read the user row, taking a row lock where the backend supports it so
/// concurrent check-then-insert sequences for the same user serialize.
pub(crate) async fn lock_user<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<user::Model, ServiceError> {
    let mut q = user::Entity::find_by_id(id);
    if db.get_database_backend() == DbBackend::Postgres {
        q = q.lock_exclusive();
    }
    q.one(db).await?.ok_or_else(|| ServiceError::not_found("user"))
}
