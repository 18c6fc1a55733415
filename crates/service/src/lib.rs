//! Academic records service: the only writer of users, courses, enrollments,
//! assignments, submissions and the audit log.
//! - Every operation receives the caller's identity explicitly ([`context::Caller`]).
//! - Storage access is bounded in time and mapped onto [`errors::ServiceError`].
//! - Audit writes are best effort and never undo the operation they describe.

use std::sync::Arc;

use sea_orm::DatabaseConnection;

pub mod errors;
pub mod context;
pub mod clock;
pub mod storage;
pub mod retry;
pub mod audit;
pub mod auth;
pub mod academic;
pub mod pagination;
#[cfg(test)]
pub mod test_support;

use academic::{AcademicService, Policy};
use audit::SeaOrmAuditSink;
use auth::repo::seaorm::SeaOrmAuthRepository;
use auth::{AuthConfig, AuthService};
use clock::Clock;
use retry::RetryPolicy;

/// Everything an outer surface needs, wired to one database.
pub struct Services {
    pub auth: AuthService<SeaOrmAuthRepository>,
    pub academic: AcademicService,
    pub retry: RetryPolicy,
}

impl Services {
    pub fn new(db: DatabaseConnection, cfg: &configs::AppConfig, clock: Arc<dyn Clock>) -> Self {
        let policy = Policy::from_config(&cfg.policy);
        let audit = Arc::new(SeaOrmAuditSink::new(db.clone(), policy.storage_timeout));
        let auth = AuthService::new(
            Arc::new(SeaOrmAuthRepository::new(db.clone())),
            audit.clone(),
            clock.clone(),
            AuthConfig::from_app(cfg),
        );
        let academic = AcademicService::new(db, policy, clock, audit);
        Self { auth, academic, retry: RetryPolicy::from_config(&cfg.policy) }
    }
}
