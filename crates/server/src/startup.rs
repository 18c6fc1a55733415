use std::{net::SocketAddr, sync::Arc};

use axum::Router;
use dotenvy::dotenv;
use migration::MigratorTrait;
use sea_orm::DatabaseConnection;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use common::env::ensure_sqlite_parent;
use common::utils::logging::{init_logging, LogFormat};
use configs::AppConfig;
use models::db::{connect_with_config, DatabaseConfig};
use service::clock::SystemClock;
use service::Services;

use crate::auth::ServerState;
use crate::errors::StartupError;
use crate::routes;

const DEV_JWT_SECRET: &str = "dev-secret-change-me";

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

fn bind_addr(cfg: &AppConfig) -> anyhow::Result<SocketAddr> {
    Ok(format!("{}:{}", cfg.server.host, cfg.server.port).parse()?)
}

/// Router over an already migrated database.
///
/// Creates the configured bootstrap admin and, when enabled, the demo data
/// before the first request can arrive.
pub async fn build_app(db: DatabaseConnection, cfg: &AppConfig) -> anyhow::Result<Router> {
    let services = Services::new(db, cfg, Arc::new(SystemClock));
    if let Some(admin) = &cfg.auth.bootstrap_admin {
        services.auth.ensure_admin(&admin.username, &admin.email, &admin.password).await?;
    }
    if cfg.policy.seed_demo_data && services.academic.seed_demo_data().await? {
        info!("demo accounts created");
    }
    Ok(routes::build_router(ServerState::new(services), build_cors()))
}

/// Connect and bring the schema up to date.
pub async fn prepare_database(cfg: &AppConfig) -> anyhow::Result<DatabaseConnection> {
    ensure_sqlite_parent(&cfg.database.url).await?;
    let db = connect_with_config(&DatabaseConfig::from(&cfg.database)).await?;
    migration::Migrator::up(&db, None)
        .await
        .map_err(|e| StartupError::Database(e.to_string()))?;
    Ok(db)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

/// Public entry: load config, prepare storage and serve until Ctrl+C.
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    let mut cfg = AppConfig::load_or_env().map_err(|e| StartupError::InvalidConfig(e.to_string()))?;
    init_logging(LogFormat::parse(&cfg.logging.format), cfg.logging.filter.as_deref());

    if cfg.auth.jwt_secret.trim().is_empty() {
        warn!("JWT_SECRET not set; using the development secret");
        cfg.auth.jwt_secret = DEV_JWT_SECRET.to_string();
    }

    let db = prepare_database(&cfg).await?;
    let app = build_app(db, &cfg).await?;

    let addr = bind_addr(&cfg)?;
    info!(%addr, "starting academic records server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    info!("server stopped");
    Ok(())
}
