use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use service::auth::domain::RegisterInput;
use service::context::Role;

use crate::auth::{CurrentUser, ServerState, AUTH_COOKIE};
use crate::errors::ApiError;

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    /// Only `student` is accepted here; staff accounts are created via `POST /users`.
    #[serde(default = "student")]
    #[schema(value_type = Option<String>)]
    pub role: Role,
}

fn student() -> Role { Role::Student }

#[derive(Debug, Serialize, ToSchema)]
pub struct RegisterResponse {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    /// Username or email.
    pub login: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    pub user_id: Uuid,
    pub username: String,
    #[schema(value_type = String)]
    pub role: Role,
    pub token: Option<String>,
}

#[utoipa::path(post, path = "/auth/register", tag = "auth", request_body = RegisterRequest,
    responses((status = 201, body = RegisterResponse), (status = 400, description = "Bad Request"), (status = 403, description = "Non-student role"), (status = 409, description = "Conflict")))]
pub async fn register(
    State(state): State<ServerState>,
    Json(input): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let user_id = state
        .services
        .auth
        .register_self(RegisterInput { username: input.username, email: input.email, password: input.password, role: input.role })
        .await?;
    Ok((StatusCode::CREATED, Json(RegisterResponse { user_id })))
}

#[utoipa::path(post, path = "/auth/login", tag = "auth", request_body = LoginRequest,
    responses((status = 200, body = SessionResponse), (status = 401, description = "Unauthorized")))]
pub async fn login(
    State(state): State<ServerState>,
    jar: CookieJar,
    Json(input): Json<LoginRequest>,
) -> Result<(CookieJar, Json<SessionResponse>), ApiError> {
    let session = state.services.auth.authenticate(&input.login, &input.password).await?;
    let jar = match &session.token {
        Some(token) => {
            let mut cookie = Cookie::new(AUTH_COOKIE, token.clone());
            cookie.set_path("/");
            cookie.set_http_only(true);
            cookie.set_same_site(SameSite::Lax);
            jar.add(cookie)
        }
        None => jar,
    };
    let out = SessionResponse { user_id: session.user_id, username: session.username, role: session.role, token: session.token };
    Ok((jar, Json(out)))
}

#[utoipa::path(post, path = "/auth/logout", tag = "auth", responses((status = 204, description = "Logged out")))]
pub async fn logout(
    State(state): State<ServerState>,
    CurrentUser(caller): CurrentUser,
    jar: CookieJar,
) -> Result<(CookieJar, StatusCode), ApiError> {
    state.services.auth.logout(&caller).await?;
    let mut gone = Cookie::from(AUTH_COOKIE);
    gone.set_path("/");
    Ok((jar.remove(gone), StatusCode::NO_CONTENT))
}

#[utoipa::path(get, path = "/auth/me", tag = "auth", responses((status = 200, body = SessionResponse), (status = 401, description = "Unauthorized")))]
pub async fn me(State(state): State<ServerState>, CurrentUser(caller): CurrentUser) -> Result<Json<SessionResponse>, ApiError> {
    let (user_id, username, role) = state.services.auth.whoami(&caller).await?;
    Ok(Json(SessionResponse { user_id, username, role, token: None }))
}
