use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use models::submission;
use service::academic::{MySubmission, SubmissionState, UpcomingAssignments};

use super::with_retry;
use crate::auth::{CurrentUser, ServerState};
use crate::errors::ApiError;

#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitRequest {
    /// Inline text answer; mutually exclusive with `file_name`.
    pub content: Option<String>,
    pub file_name: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct GradeRequest {
    pub score: f64,
    pub feedback: Option<String>,
}

#[utoipa::path(get, path = "/assignments/upcoming", tag = "assignments", responses((status = 200, description = "Open assignments, earliest deadline first")))]
pub async fn upcoming(
    State(state): State<ServerState>,
    CurrentUser(caller): CurrentUser,
) -> Result<Json<UpcomingAssignments>, ApiError> {
    let svc = &state.services.academic;
    let caller = &caller;
    Ok(Json(with_retry(&state, move || svc.list_upcoming_assignments(caller)).await?))
}

#[utoipa::path(get, path = "/assignments/pending", tag = "assignments", responses((status = 200, description = "Open assignments not yet handed in")))]
pub async fn pending(
    State(state): State<ServerState>,
    CurrentUser(caller): CurrentUser,
) -> Result<Json<UpcomingAssignments>, ApiError> {
    let svc = &state.services.academic;
    let caller = &caller;
    Ok(Json(with_retry(&state, move || svc.pending_assignments(caller)).await?))
}

#[utoipa::path(delete, path = "/assignments/{id}", tag = "assignments", params(("id" = Uuid, Path,)), responses((status = 204, description = "Deleted")))]
pub async fn delete(
    State(state): State<ServerState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.services.academic.delete_assignment(&caller, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(get, path = "/assignments/{id}/state", tag = "assignments", params(("id" = Uuid, Path,)), responses((status = 200, description = "unsubmitted, submitted or graded")))]
pub async fn state_of(
    State(state): State<ServerState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<SubmissionState>, ApiError> {
    let svc = &state.services.academic;
    let caller = &caller;
    Ok(Json(with_retry(&state, move || svc.submission_state(caller, id)).await?))
}

#[utoipa::path(post, path = "/assignments/{id}/submissions", tag = "assignments", params(("id" = Uuid, Path,)), request_body = SubmitRequest,
    responses((status = 201, description = "Submitted"), (status = 409, description = "Already submitted"), (status = 422, description = "Deadline passed or not enrolled")))]
pub async fn submit(
    State(state): State<ServerState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<Uuid>,
    Json(input): Json<SubmitRequest>,
) -> Result<(StatusCode, Json<submission::Model>), ApiError> {
    let created = state.services.academic.submit(&caller, id, input.content, input.file_name).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(put, path = "/submissions/{id}/grade", tag = "grading", params(("id" = Uuid, Path,)), request_body = GradeRequest,
    responses((status = 200, description = "Graded"), (status = 400, description = "Score out of range"), (status = 403, description = "Forbidden")))]
pub async fn grade(
    State(state): State<ServerState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<Uuid>,
    Json(input): Json<GradeRequest>,
) -> Result<Json<submission::Model>, ApiError> {
    Ok(Json(state.services.academic.grade(&caller, id, input.score, input.feedback).await?))
}

#[utoipa::path(get, path = "/submissions/mine", tag = "grading", responses((status = 200, description = "Caller's submissions with scores")))]
pub async fn mine(State(state): State<ServerState>, CurrentUser(caller): CurrentUser) -> Result<Json<Vec<MySubmission>>, ApiError> {
    let svc = &state.services.academic;
    let caller = &caller;
    Ok(Json(with_retry(&state, move || svc.my_submissions(caller)).await?))
}
