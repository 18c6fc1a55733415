use std::sync::Arc;

use axum::async_trait;
use axum::extract::{FromRequestParts, Request, State};
use axum::http::{header, request::Parts, Method};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;

use service::context::Caller;
use service::Services;

use crate::errors::ApiError;

pub const AUTH_COOKIE: &str = "auth_token";

#[derive(Clone)]
pub struct ServerState {
    pub services: Arc<Services>,
}

impl ServerState {
    pub fn new(services: Services) -> Self {
        Self { services: Arc::new(services) }
    }
}

fn is_public(path: &str, method: &Method) -> bool {
    method == Method::OPTIONS
        || path == "/health"
        || path == "/metrics"
        || path == "/auth/login"
        || path == "/auth/register"
        || path.starts_with("/docs")
        || path.starts_with("/api-docs")
}

/// `Authorization: Bearer <token>` first, then the `auth_token` cookie.
fn token_from(req: &Request) -> Result<Option<String>, ApiError> {
    if let Some(h) = req.headers().get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        return match h.strip_prefix("Bearer ") {
            Some(t) if !t.trim().is_empty() => Ok(Some(t.trim().to_string())),
            _ => Err(ApiError::unauthorized("invalid Authorization format (expect Bearer)")),
        };
    }
    let jar = CookieJar::from_headers(req.headers());
    Ok(jar.get(AUTH_COOKIE).map(|c| c.value().to_string()).filter(|v| !v.is_empty()))
}

/// Resolves the session token into a [`Caller`] stored in request extensions.
/// Everything outside the public allow-list is rejected without one.
pub async fn require_session(State(state): State<ServerState>, mut req: Request, next: Next) -> Response {
    if is_public(req.uri().path(), req.method()) {
        return next.run(req).await;
    }
    let path = req.uri().path().to_string();
    let token = match token_from(&req) {
        Ok(Some(t)) => t,
        Ok(None) => {
            tracing::warn!(%path, "missing Authorization header and auth_token cookie");
            return ApiError::unauthorized("authentication required").into_response();
        }
        Err(e) => return e.into_response(),
    };
    match state.services.auth.verify_token(&token) {
        Ok(caller) => {
            req.extensions_mut().insert(caller);
            next.run(req).await
        }
        Err(e) => {
            tracing::warn!(%path, "token validation failed");
            ApiError::from(e).into_response()
        }
    }
}

/// The authenticated caller, as placed by [`require_session`].
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub Caller);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Caller>()
            .copied()
            .map(CurrentUser)
            .ok_or_else(|| ApiError::unauthorized("authentication required"))
    }
}
