//! Store-level tests. Every test opens its own in-memory SQLite database with
//! the full migration set applied, so no external server is needed.

use crate::db::{connect_with_config, DatabaseConfig};
use migration::MigratorTrait;
use sea_orm::DatabaseConnection;




pub(crate) async fn setup_test_db() -> anyhow::Result<DatabaseConnection> {
    let cfg = DatabaseConfig { url: "sqlite::memory:".to_string(), ..DatabaseConfig::default() };
    let db = connect_with_config(&cfg).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

pub(crate) async fn seed_user(db: &DatabaseConnection, name: &str, role: crate::user::Role) -> anyhow::Result<crate::user::Model> {
    Ok(crate::user::create(db, name, &format!("{name}@example.com"), "$argon2id$stub".to_string(), role).await?)
}
