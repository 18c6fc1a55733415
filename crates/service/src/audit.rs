//! Append-only audit trail.
//!
//! Writes are best effort: the primary operation has already committed by the
//! time an entry is recorded, so a failed write is logged under the `audit`
//! target and counted, never propagated.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder};
use serde::Serialize;
use tracing::{debug, error};
use uuid::Uuid;

use common::observability::AUDIT_WRITE_FAILURES_TOTAL;
use models::{audit_log, DateTimeWithTimeZone};

use crate::context::Caller;
use crate::errors::ServiceError;
use crate::pagination::Pagination;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AuditAction {
    Register,
    Login,
    FailedLogin,
    Logout,
    Enroll,
    Unenroll,
    Submission,
    Grading,
    CreateCourse,
    DeleteCourse,
    CreateAssignment,
    DeleteAssignment,
    CreateUser,
    UpdateUser,
    DeleteUser,
}

impl AuditAction {
    pub fn label(&self) -> &'static str {
        match self {
            AuditAction::Register => "Register",
            AuditAction::Login => "Login",
            AuditAction::FailedLogin => "FailedLogin",
            AuditAction::Logout => "Logout",
            AuditAction::Enroll => "Enroll",
            AuditAction::Unenroll => "Unenroll",
            AuditAction::Submission => "Submission",
            AuditAction::Grading => "Grading",
            AuditAction::CreateCourse => "CreateCourse",
            AuditAction::DeleteCourse => "DeleteCourse",
            AuditAction::CreateAssignment => "CreateAssignment",
            AuditAction::DeleteAssignment => "DeleteAssignment",
            AuditAction::CreateUser => "CreateUser",
            AuditAction::UpdateUser => "UpdateUser",
            AuditAction::DeleteUser => "DeleteUser",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuditEntry {
    pub user_id: Option<Uuid>,
    pub action: AuditAction,
    pub details: String,
    pub timestamp: DateTimeWithTimeZone,
}

impl AuditEntry {
    pub fn new(user_id: Option<Uuid>, action: AuditAction, details: impl Into<String>, timestamp: DateTimeWithTimeZone) -> Self {
        Self { user_id, action, details: details.into(), timestamp }
    }
}

#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn write(&self, entry: &AuditEntry) -> Result<(), ServiceError>;
}

/// Record `entry`, swallowing (but reporting) any failure.
pub async fn record(sink: &dyn AuditSink, entry: AuditEntry) {
    match sink.write(&entry).await {
        Ok(()) => debug!(target: "audit", action = entry.action.label(), user_id = ?entry.user_id, "audit entry written"),
        Err(e) => {
            AUDIT_WRITE_FAILURES_TOTAL.inc();
            error!(
                target: "audit",
                action = entry.action.label(),
                user_id = ?entry.user_id,
                details = %entry.details,
                error = %e,
                "audit write failed"
            );
        }
    }
}

/// Persists entries to `audit_logs` with its own bounded timeout.
pub struct SeaOrmAuditSink {
    pub db: DatabaseConnection,
    pub timeout: Duration,
}

impl SeaOrmAuditSink {
    pub fn new(db: DatabaseConnection, timeout: Duration) -> Self { Self { db, timeout } }
}

#[async_trait]
impl AuditSink for SeaOrmAuditSink {
    async fn write(&self, entry: &AuditEntry) -> Result<(), ServiceError> {
        let fut = audit_log::append(&self.db, entry.user_id, entry.action.label(), &entry.details, entry.timestamp);
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(res) => res.map(|_| ()).map_err(Into::into),
            Err(_) => Err(ServiceError::StorageUnavailable("audit write timed out".into())),
        }
    }
}

/// Keeps entries in memory; used where no database is wired in.
#[derive(Default)]
pub struct MemoryAuditSink {
    entries: Mutex<Vec<AuditEntry>>,
}

impl MemoryAuditSink {
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn write(&self, entry: &AuditEntry) -> Result<(), ServiceError> {
        self.entries.lock().unwrap_or_else(|p| p.into_inner()).push(entry.clone());
        Ok(())
    }
}

/// Newest first. Admin only.
pub async fn list_audit_logs(
    db: &DatabaseConnection,
    caller: &Caller,
    page: Pagination,
) -> Result<Vec<audit_log::Model>, ServiceError> {
    caller.require_admin()?;
    Ok(page.fetch(db, audit_log::Entity::find().order_by_desc(audit_log::Column::Timestamp)).await?)
}
