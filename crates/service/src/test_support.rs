#![cfg(test)]
use std::sync::Arc;

use migration::MigratorTrait;
use sea_orm::DatabaseConnection;
use uuid::Uuid;
use models::db::{connect_with_config, DatabaseConfig};

use crate::academic::{AcademicService, Policy};
use crate::audit::SeaOrmAuditSink;
use crate::auth::domain::RegisterInput;
use crate::auth::repo::seaorm::SeaOrmAuthRepository;
use crate::auth::{AuthConfig, AuthService};
use crate::clock::ManualClock;
use crate::context::{Caller, Role};

/// Fresh in-memory database with all migrations applied.
pub async fn get_db() -> Result<DatabaseConnection, anyhow::Error> {
    migrated(&DatabaseConfig { url: "sqlite::memory:".to_string(), ..DatabaseConfig::default() }).await
}

/// Fresh file-backed database under the temp dir, opened with the shipped
/// pool settings.
pub async fn get_file_db() -> Result<DatabaseConnection, anyhow::Error> {
    let path = std::env::temp_dir().join(format!("lms_test_{}.db", Uuid::new_v4()));
    let url = format!("sqlite://{}?mode=rwc", path.display());
    migrated(&DatabaseConfig::from(&configs::DatabaseConfig { url, ..Default::default() })).await
}

async fn migrated(cfg: &DatabaseConfig) -> Result<DatabaseConnection, anyhow::Error> {
    let db = connect_with_config(cfg).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

pub struct Harness {
    pub db: DatabaseConnection,
    pub clock: Arc<ManualClock>,
    pub auth: AuthService<SeaOrmAuthRepository>,
    pub svc: AcademicService,
}

impl Harness {
    pub async fn new() -> Result<Self, anyhow::Error> {
        Self::with_policy(Policy::default()).await
    }

    pub async fn with_policy(policy: Policy) -> Result<Self, anyhow::Error> {
        Ok(Self::build(get_db().await?, policy))
    }

    pub async fn on_file(policy: Policy) -> Result<Self, anyhow::Error> {
        Ok(Self::build(get_file_db().await?, policy))
    }

    fn build(db: DatabaseConnection, policy: Policy) -> Self {
        let clock = Arc::new(ManualClock::starting_now());
        let audit = Arc::new(SeaOrmAuditSink::new(db.clone(), policy.storage_timeout));
        let auth = AuthService::new(
            Arc::new(SeaOrmAuthRepository::new(db.clone())),
            audit.clone(),
            clock.clone(),
            AuthConfig { jwt_secret: Some("test-secret".into()), ..AuthConfig::default() },
        );
        let svc = AcademicService::new(db.clone(), policy, clock.clone(), audit);
        Self { db, clock, auth, svc }
    }

    /// Register through the real flow and return the resulting caller.
    pub async fn user(&self, username: &str, role: Role) -> Result<Caller, anyhow::Error> {
        let id = self
            .auth
            .register(RegisterInput {
                username: username.into(),
                email: format!("{username}@example.com"),
                password: "password123".into(),
                role,
            })
            .await?;
        Ok(Caller::new(id, role))
    }
}
