use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use models::{assignment, course, enrollment, submission, DateTimeWithTimeZone};
use service::academic::{CourseView, EnrolledCourse};

use super::with_retry;
use crate::auth::{CurrentUser, ServerState};
use crate::errors::ApiError;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCourseRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Required when an admin creates the course.
    pub instructor_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCourseRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProgressRequest {
    /// Fraction in `[0, 1]`.
    pub progress: f64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateAssignmentRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub max_score: f64,
    /// RFC 3339 timestamp, must lie in the future.
    #[schema(value_type = String, format = DateTime)]
    pub deadline: DateTimeWithTimeZone,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[utoipa::path(get, path = "/courses", tag = "courses", responses((status = 200, description = "Courses visible to the caller")))]
pub async fn list(State(state): State<ServerState>, CurrentUser(caller): CurrentUser) -> Result<Json<Vec<CourseView>>, ApiError> {
    let svc = &state.services.academic;
    let caller = &caller;
    Ok(Json(with_retry(&state, move || svc.list_courses(caller)).await?))
}

#[utoipa::path(post, path = "/courses", tag = "courses", request_body = CreateCourseRequest,
    responses((status = 201, description = "Created"), (status = 403, description = "Forbidden")))]
pub async fn create(
    State(state): State<ServerState>,
    CurrentUser(caller): CurrentUser,
    Json(input): Json<CreateCourseRequest>,
) -> Result<(StatusCode, Json<course::Model>), ApiError> {
    let created = state.services.academic.create_course(&caller, input.instructor_id, &input.name, &input.description).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(get, path = "/courses/available", tag = "courses", responses((status = 200, description = "Courses the student may join")))]
pub async fn available(State(state): State<ServerState>, CurrentUser(caller): CurrentUser) -> Result<Json<Vec<course::Model>>, ApiError> {
    let svc = &state.services.academic;
    let caller = &caller;
    Ok(Json(with_retry(&state, move || svc.available_courses(caller)).await?))
}

#[utoipa::path(get, path = "/courses/search", tag = "courses", params(SearchQuery), responses((status = 200, description = "Matching courses")))]
pub async fn search(
    State(state): State<ServerState>,
    CurrentUser(caller): CurrentUser,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<course::Model>>, ApiError> {
    let svc = &state.services.academic;
    let (caller, term) = (&caller, query.q.as_str());
    Ok(Json(with_retry(&state, move || svc.search_courses(caller, term)).await?))
}

#[utoipa::path(get, path = "/courses/{id}", tag = "courses", params(("id" = Uuid, Path,)), responses((status = 200, description = "Course"), (status = 404, description = "Not Found")))]
pub async fn get(
    State(state): State<ServerState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<course::Model>, ApiError> {
    let svc = &state.services.academic;
    let caller = &caller;
    Ok(Json(with_retry(&state, move || svc.get_course(caller, id)).await?))
}

#[utoipa::path(put, path = "/courses/{id}", tag = "courses", params(("id" = Uuid, Path,)), request_body = UpdateCourseRequest,
    responses((status = 200, description = "Updated"), (status = 403, description = "Forbidden")))]
pub async fn update(
    State(state): State<ServerState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateCourseRequest>,
) -> Result<Json<course::Model>, ApiError> {
    let updated = state
        .services
        .academic
        .update_course(&caller, id, input.name.as_deref(), input.description.as_deref())
        .await?;
    Ok(Json(updated))
}

#[utoipa::path(delete, path = "/courses/{id}", tag = "courses", params(("id" = Uuid, Path,)), responses((status = 204, description = "Deleted")))]
pub async fn delete(
    State(state): State<ServerState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.services.academic.delete_course(&caller, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(put, path = "/courses/{id}/progress", tag = "courses", params(("id" = Uuid, Path,)), request_body = ProgressRequest,
    responses((status = 200, description = "Updated"), (status = 400, description = "Out of range")))]
pub async fn set_progress(
    State(state): State<ServerState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<Uuid>,
    Json(input): Json<ProgressRequest>,
) -> Result<Json<course::Model>, ApiError> {
    Ok(Json(state.services.academic.update_course_progress(&caller, id, input.progress).await?))
}

#[utoipa::path(get, path = "/courses/{id}/assignments", tag = "courses", params(("id" = Uuid, Path,)), responses((status = 200, description = "Assignments by deadline")))]
pub async fn assignments(
    State(state): State<ServerState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<assignment::Model>>, ApiError> {
    let svc = &state.services.academic;
    let caller = &caller;
    Ok(Json(with_retry(&state, move || svc.list_course_assignments(caller, id)).await?))
}

#[utoipa::path(post, path = "/courses/{id}/assignments", tag = "courses", params(("id" = Uuid, Path,)), request_body = CreateAssignmentRequest,
    responses((status = 201, description = "Created"), (status = 400, description = "Bad Request"), (status = 403, description = "Forbidden")))]
pub async fn create_assignment(
    State(state): State<ServerState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<Uuid>,
    Json(input): Json<CreateAssignmentRequest>,
) -> Result<(StatusCode, Json<assignment::Model>), ApiError> {
    let created = state
        .services
        .academic
        .create_assignment(&caller, id, &input.title, &input.description, input.max_score, input.deadline)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(post, path = "/courses/{id}/enrollment", tag = "enrollment", params(("id" = Uuid, Path,)),
    responses((status = 201, description = "Enrolled"), (status = 409, description = "Already enrolled"), (status = 422, description = "Limit reached")))]
pub async fn enroll(
    State(state): State<ServerState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<enrollment::Model>), ApiError> {
    Ok((StatusCode::CREATED, Json(state.services.academic.enroll(&caller, id).await?)))
}

#[utoipa::path(delete, path = "/courses/{id}/enrollment", tag = "enrollment", params(("id" = Uuid, Path,)), responses((status = 204, description = "Unenrolled")))]
pub async fn unenroll(
    State(state): State<ServerState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.services.academic.unenroll(&caller, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(put, path = "/courses/{id}/enrollments/{student_id}/progress", tag = "enrollment",
    params(("id" = Uuid, Path,), ("student_id" = Uuid, Path,)), request_body = ProgressRequest,
    responses((status = 200, description = "Updated")))]
pub async fn set_student_progress(
    State(state): State<ServerState>,
    CurrentUser(caller): CurrentUser,
    Path((id, student_id)): Path<(Uuid, Uuid)>,
    Json(input): Json<ProgressRequest>,
) -> Result<Json<enrollment::Model>, ApiError> {
    Ok(Json(state.services.academic.update_enrollment_progress(&caller, student_id, id, input.progress).await?))
}

#[utoipa::path(get, path = "/courses/{id}/submissions", tag = "grading", params(("id" = Uuid, Path,)), responses((status = 200, description = "Submissions to grade")))]
pub async fn submissions(
    State(state): State<ServerState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<submission::Model>>, ApiError> {
    let svc = &state.services.academic;
    let caller = &caller;
    Ok(Json(with_retry(&state, move || svc.list_course_submissions(caller, id)).await?))
}

#[utoipa::path(get, path = "/enrollments", tag = "enrollment", responses((status = 200, description = "Caller's enrollments")))]
pub async fn my_enrollments(
    State(state): State<ServerState>,
    CurrentUser(caller): CurrentUser,
) -> Result<Json<Vec<EnrolledCourse>>, ApiError> {
    let svc = &state.services.academic;
    let caller = &caller;
    Ok(Json(with_retry(&state, move || svc.list_enrollments(caller)).await?))
}
