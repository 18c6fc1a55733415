use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr};
use once_cell::sync::Lazy;
use std::env;
use std::time::Duration;
use tracing::{info, warn};

pub static DATABASE_URL: Lazy<String> = Lazy::new(|| {
    // Load .env if present
    let _ = dotenvy::dotenv();
    env::var("DATABASE_URL").unwrap_or_else(|_| configs::DEFAULT_DATABASE_URL.to_string())
});

const CONNECT_ATTEMPTS: u32 = 3;

/// Pool settings used when opening the store.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout: Duration,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
    pub sqlx_logging: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::from(&configs::DatabaseConfig { url: DATABASE_URL.clone(), ..Default::default() })
    }
}

impl From<&configs::DatabaseConfig> for DatabaseConfig {
    fn from(c: &configs::DatabaseConfig) -> Self {
        Self {
            url: c.url.clone(),
            max_connections: c.max_connections,
            min_connections: c.min_connections,
            connect_timeout: Duration::from_secs(c.connect_timeout_secs),
            acquire_timeout: Duration::from_secs(c.acquire_timeout_secs),
            idle_timeout: Duration::from_secs(c.idle_timeout_secs),
            max_lifetime: Duration::from_secs(c.max_lifetime_secs),
            sqlx_logging: c.sqlx_logging,
        }
    }
}

impl DatabaseConfig {
    pub fn is_sqlite(&self) -> bool { self.url.starts_with("sqlite:") }

    /// In-memory SQLite lives inside a single connection, so the pool must not
    /// recycle it.
    pub fn is_in_memory(&self) -> bool {
        self.is_sqlite() && self.url.contains(":memory:")
    }

    /// Upper bound on pooled connections. SQLite admits one writer and fails
    /// a deferred transaction's read-to-write upgrade with `SQLITE_BUSY`
    /// instead of waiting, so every SQLite store gets exactly one connection
    /// and writers queue on the pool.
    pub fn pool_size(&self) -> u32 {
        if self.is_sqlite() { 1 } else { self.max_connections }
    }

    fn connect_options(&self) -> ConnectOptions {
        let mut opt = ConnectOptions::new(self.url.clone());
        opt.connect_timeout(self.connect_timeout)
            .acquire_timeout(self.acquire_timeout)
            .sqlx_logging(self.sqlx_logging);
        let size = self.pool_size();
        let min = if self.is_in_memory() { 1 } else { self.min_connections.min(size) };
        opt.max_connections(size).min_connections(min);
        if !self.is_in_memory() {
            opt.idle_timeout(self.idle_timeout).max_lifetime(self.max_lifetime);
        }
        opt
    }
}

/// Open the pool, retrying transient failures with a short linear backoff.
pub async fn connect_with_config(cfg: &DatabaseConfig) -> anyhow::Result<DatabaseConnection> {
    let mut last_err: Option<DbErr> = None;
    for attempt in 1..=CONNECT_ATTEMPTS {
        match Database::connect(cfg.connect_options()).await {
            Ok(db) => {
                info!(backend = ?db.get_database_backend(), attempt, "database connected");
                return Ok(db);
            }
            Err(e) => {
                warn!(attempt, error = %e, "database connect failed");
                last_err = Some(e);
                if attempt < CONNECT_ATTEMPTS {
                    tokio::time::sleep(cfg.connect_timeout.min(Duration::from_millis(200)) * attempt).await;
                }
            }
        }
    }
    Err(anyhow::anyhow!(
        "database connect failed after {CONNECT_ATTEMPTS} attempts: {}",
        last_err.map(|e| e.to_string()).unwrap_or_default()
    ))
}

/// Round-trip a trivial statement to prove the pool is usable.
pub async fn test_connection(db: &DatabaseConnection) -> Result<(), DbErr> {
    db.ping().await
}
