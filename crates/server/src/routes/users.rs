use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use models::{audit_log, user};
use service::academic::SummaryReport;
use service::auth::domain::RegisterInput;
use service::context::Role;
use service::pagination::Pagination;

use super::auth::RegisterResponse;
use super::with_retry;
use crate::auth::{CurrentUser, ServerState};
use crate::errors::ApiError;

#[derive(Debug, Deserialize, IntoParams)]
pub struct UserSearch {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct RecentQuery {
    pub limit: Option<u64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    /// `admin`, `instructor` or `student`
    #[schema(value_type = String)]
    pub role: Role,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
}

#[utoipa::path(get, path = "/users", tag = "users",
    params(("page" = Option<u32>, Query, description = "1-based"), ("per_page" = Option<u32>, Query, description = "at most 100")),
    responses((status = 200, description = "Users by username"), (status = 403, description = "Forbidden")))]
pub async fn list(
    State(state): State<ServerState>,
    CurrentUser(caller): CurrentUser,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<user::Model>>, ApiError> {
    let svc = &state.services.academic;
    let caller = &caller;
    Ok(Json(with_retry(&state, move || svc.list_users(caller, page)).await?))
}

/// Accounts of any role; admin only. Public sign-up stays student-only.
#[utoipa::path(post, path = "/users", tag = "users", request_body = CreateUserRequest,
    responses((status = 201, body = RegisterResponse), (status = 403, description = "Forbidden"), (status = 409, description = "Conflict")))]
pub async fn create(
    State(state): State<ServerState>,
    CurrentUser(caller): CurrentUser,
    Json(input): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let input = RegisterInput { username: input.username, email: input.email, password: input.password, role: input.role };
    let user_id = state.services.auth.create_account(&caller, input).await?;
    Ok((StatusCode::CREATED, Json(RegisterResponse { user_id })))
}

#[utoipa::path(get, path = "/users/search", tag = "users", params(UserSearch), responses((status = 200, description = "Matching users")))]
pub async fn search(
    State(state): State<ServerState>,
    CurrentUser(caller): CurrentUser,
    Query(q): Query<UserSearch>,
) -> Result<Json<Vec<user::Model>>, ApiError> {
    let svc = &state.services.academic;
    let (caller, term) = (&caller, q.q.as_str());
    Ok(Json(with_retry(&state, move || svc.search_users(caller, term)).await?))
}

#[utoipa::path(get, path = "/users/{id}", tag = "users", params(("id" = Uuid, Path,)), responses((status = 200, description = "User"), (status = 404, description = "Not Found")))]
pub async fn get(
    State(state): State<ServerState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<user::Model>, ApiError> {
    let svc = &state.services.academic;
    let caller = &caller;
    Ok(Json(with_retry(&state, move || svc.get_user(caller, id)).await?))
}

#[utoipa::path(put, path = "/users/{id}", tag = "users", params(("id" = Uuid, Path,)), request_body = UpdateUserRequest,
    responses((status = 200, description = "Updated"), (status = 409, description = "Conflict")))]
pub async fn update(
    State(state): State<ServerState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateUserRequest>,
) -> Result<Json<user::Model>, ApiError> {
    let updated = state
        .services
        .academic
        .update_user(&caller, id, input.username.as_deref(), input.email.as_deref())
        .await?;
    Ok(Json(updated))
}

#[utoipa::path(delete, path = "/users/{id}", tag = "users", params(("id" = Uuid, Path,)), responses((status = 204, description = "Deleted")))]
pub async fn delete(
    State(state): State<ServerState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.services.academic.delete_user(&caller, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(get, path = "/reports/summary", tag = "reports", responses((status = 200, description = "Dashboard figures"), (status = 403, description = "Forbidden")))]
pub async fn summary(State(state): State<ServerState>, CurrentUser(caller): CurrentUser) -> Result<Json<SummaryReport>, ApiError> {
    let svc = &state.services.academic;
    let caller = &caller;
    Ok(Json(with_retry(&state, move || svc.summary_report(caller)).await?))
}

#[utoipa::path(get, path = "/reports/recent-users", tag = "reports", params(RecentQuery), responses((status = 200, description = "Newest accounts first")))]
pub async fn recent_users(
    State(state): State<ServerState>,
    CurrentUser(caller): CurrentUser,
    Query(q): Query<RecentQuery>,
) -> Result<Json<Vec<user::Model>>, ApiError> {
    let svc = &state.services.academic;
    let (caller, limit) = (&caller, q.limit.unwrap_or(10));
    Ok(Json(with_retry(&state, move || svc.recent_users(caller, limit)).await?))
}

#[utoipa::path(get, path = "/audit-logs", tag = "reports",
    params(("page" = Option<u32>, Query, description = "1-based"), ("per_page" = Option<u32>, Query, description = "at most 100")),
    responses((status = 200, description = "Audit trail, newest first")))]
pub async fn audit_logs(
    State(state): State<ServerState>,
    CurrentUser(caller): CurrentUser,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<audit_log::Model>>, ApiError> {
    let svc = &state.services.academic;
    let caller = &caller;
    Ok(Json(with_retry(&state, move || svc.list_audit_logs(caller, page)).await?))
}
