#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

pub const ADMIN: &str = "root";
pub const PASSWORD: &str = "password123";

/// Fresh app over an in-memory SQLite database, with `root` as the
/// bootstrap admin.
pub async fn build_app() -> anyhow::Result<Router> {
    let mut cfg = configs::AppConfig::default();
    cfg.database.url = "sqlite::memory:".into();
    cfg.auth.jwt_secret = "test-secret".into();
    cfg.auth.bootstrap_admin = Some(configs::BootstrapAdmin {
        username: ADMIN.into(),
        email: format!("{ADMIN}@example.com"),
        password: PASSWORD.into(),
    });
    let db = server::prepare_database(&cfg).await?;
    server::build_app(db, &cfg).await
}

pub async fn call(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> anyhow::Result<(StatusCode, Value)> {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    let req = match body {
        Some(v) => req.header(header::CONTENT_TYPE, "application/json").body(Body::from(serde_json::to_vec(&v)?))?,
        None => req.body(Body::empty())?,
    };
    let resp = app.clone().oneshot(req).await?;
    let status = resp.status();
    let bytes = resp.into_body().collect().await?.to_bytes();
    let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap_or(Value::Null) };
    Ok((status, json))
}

/// Log in; returns (user_id, token).
pub async fn login(app: &Router, username: &str) -> anyhow::Result<(String, String)> {
    let (status, body) = call(app, "POST", "/auth/login", None, Some(json!({"login": username, "password": PASSWORD}))).await?;
    assert_eq!(status, StatusCode::OK, "login {username}");
    let id = body["user_id"].as_str().unwrap_or_default().to_string();
    let token = body["token"].as_str().unwrap_or_default().to_string();
    Ok((id, token))
}

pub async fn admin_token(app: &Router) -> anyhow::Result<String> {
    Ok(login(app, ADMIN).await?.1)
}

/// Create an account and log in as it. Students sign themselves up; other
/// roles are created by the bootstrap admin.
pub async fn signup(app: &Router, username: &str, role: &str) -> anyhow::Result<(String, String)> {
    let body = json!({
        "username": username,
        "email": format!("{username}@example.com"),
        "password": PASSWORD,
        "role": role,
    });
    let (status, _) = if role == "student" {
        call(app, "POST", "/auth/register", None, Some(body)).await?
    } else {
        let admin = admin_token(app).await?;
        call(app, "POST", "/users", Some(&admin), Some(body)).await?
    };
    assert_eq!(status, StatusCode::CREATED, "create {username}");
    login(app, username).await
}
