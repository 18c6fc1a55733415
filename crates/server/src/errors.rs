use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use service::errors::{ErrorKind, ServiceError};

/// JSON error body: `{"error": "...", "code": 4002}`.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    code: u16,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: u16,
    pub message: String,
}

impl ApiError {
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self { status: StatusCode::UNAUTHORIZED, code: 3003, message: msg.into() }
    }
}

pub fn status_for(kind: ErrorKind, err: &ServiceError) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Authorization => match err {
            ServiceError::InvalidCredentials | ServiceError::InvalidToken => StatusCode::UNAUTHORIZED,
            _ => StatusCode::FORBIDDEN,
        },
        ErrorKind::Policy => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Storage => StatusCode::SERVICE_UNAVAILABLE,
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        let status = status_for(e.kind(), &e);
        if status.is_server_error() {
            error!(code = e.code(), error = %e, "request failed on storage");
        }
        // storage details stay in the log
        let message = match e.kind() {
            ErrorKind::Storage => "storage unavailable, try again later".to_string(),
            _ => e.to_string(),
        };
        Self { status, code: e.code(), message }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_client_error() {
            warn!(status = %self.status, code = self.code, message = %self.message, "request rejected");
        }
        (self.status, Json(ErrorBody { error: self.message, code: self.code })).into_response()
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("database not ready: {0}")]
    Database(String),
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_to_statuses() {
        let cases = [
            (ServiceError::InvalidEmail, StatusCode::BAD_REQUEST),
            (ServiceError::ScoreOutOfRange { max: 10.0 }, StatusCode::BAD_REQUEST),
            (ServiceError::DuplicateUsername, StatusCode::CONFLICT),
            (ServiceError::AlreadySubmitted, StatusCode::CONFLICT),
            (ServiceError::forbidden("nope"), StatusCode::FORBIDDEN),
            (ServiceError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (ServiceError::InvalidToken, StatusCode::UNAUTHORIZED),
            (ServiceError::EnrollmentLimitExceeded { limit: 6 }, StatusCode::UNPROCESSABLE_ENTITY),
            (ServiceError::DeadlinePassed, StatusCode::UNPROCESSABLE_ENTITY),
            (ServiceError::not_found("course"), StatusCode::NOT_FOUND),
            (ServiceError::StorageUnavailable("down".into()), StatusCode::SERVICE_UNAVAILABLE),
        ];
        for (err, want) in cases {
            assert_eq!(ApiError::from(err).status, want);
        }
    }

    #[test]
    fn storage_details_are_not_exposed() {
        let e = ApiError::from(ServiceError::Storage("relation \"users\" does not exist".into()));
        assert!(!e.message.contains("users"));
        assert_eq!(e.code, 5000);
    }
}
