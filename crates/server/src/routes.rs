use std::future::Future;

use axum::{
    middleware,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use common::{observability::encode_metrics, types::Health};
use service::errors::ServiceError;
use service::retry::retry_with_policy;

use crate::auth::{require_session, ServerState};
use crate::errors::ApiError;
use crate::openapi::ApiDoc;

pub mod assignments;
pub mod auth;
pub mod courses;
pub mod users;

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "OK")))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok", version: env!("CARGO_PKG_VERSION") })
}

pub async fn metrics() -> impl IntoResponse {
    encode_metrics()
}

/// Reads go through the retry policy; storage blips are retried, everything
/// else is returned on the first attempt.
pub(crate) async fn with_retry<T, F, Fut>(state: &ServerState, op: F) -> Result<T, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ServiceError>>,
{
    Ok(retry_with_policy(&state.services.retry, op).await?)
}

/// Build the full application router: public, authenticated and docs routes
pub fn build_router(state: ServerState, cors: CorsLayer) -> Router {
    let public = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login));

    let api = Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route("/users", get(users::list).post(users::create))
        .route("/users/search", get(users::search))
        .route("/users/:id", get(users::get).put(users::update).delete(users::delete))
        .route("/courses", get(courses::list).post(courses::create))
        .route("/courses/available", get(courses::available))
        .route("/courses/search", get(courses::search))
        .route("/courses/:id", get(courses::get).put(courses::update).delete(courses::delete))
        .route("/courses/:id/progress", put(courses::set_progress))
        .route("/courses/:id/assignments", get(courses::assignments).post(courses::create_assignment))
        .route("/courses/:id/enrollment", post(courses::enroll).delete(courses::unenroll))
        .route("/courses/:id/enrollments/:student_id/progress", put(courses::set_student_progress))
        .route("/courses/:id/submissions", get(courses::submissions))
        .route("/enrollments", get(courses::my_enrollments))
        .route("/assignments/upcoming", get(assignments::upcoming))
        .route("/assignments/pending", get(assignments::pending))
        .route("/assignments/:id", delete(assignments::delete))
        .route("/assignments/:id/state", get(assignments::state_of))
        .route("/assignments/:id/submissions", post(assignments::submit))
        .route("/submissions/mine", get(assignments::mine))
        .route("/submissions/:id/grade", put(assignments::grade))
        .route("/reports/summary", get(users::summary))
        .route("/reports/recent-users", get(users::recent_users))
        .route("/audit-logs", get(users::audit_logs))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_session));

    public
        .merge(api)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                // 5xx
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
