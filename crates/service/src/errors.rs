use sea_orm::DbErr;
use thiserror::Error;

use models::errors::ModelError;

/// Coarse classification used by callers to decide whether to fix input,
/// give up, or retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Conflict,
    Authorization,
    Policy,
    NotFound,
    Storage,
}

#[derive(Debug, Error)]
pub enum ServiceError {
    // validation
    #[error("invalid email address")]
    InvalidEmail,
    #[error("password must be at least {min} characters")]
    WeakPassword { min: usize },
    #[error("{what} must be within [0, 1]")]
    OutOfRange { what: &'static str },
    #[error("deadline must be in the future")]
    InvalidDeadline,
    #[error("max score must be positive")]
    InvalidScore,
    #[error("score must be within [0, {max}]")]
    ScoreOutOfRange { max: f64 },
    #[error("validation error: {0}")]
    Validation(String),

    // conflict
    #[error("username already taken")]
    DuplicateUsername,
    #[error("email already registered")]
    DuplicateEmail,
    #[error("already enrolled in this course")]
    AlreadyEnrolled,
    #[error("assignment already submitted")]
    AlreadySubmitted,

    // authorization
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("invalid or expired session token")]
    InvalidToken,

    // policy
    #[error("deadline has passed")]
    DeadlinePassed,
    #[error("enrollment limit of {limit} reached")]
    EnrollmentLimitExceeded { limit: u64 },
    #[error("not enrolled in this course")]
    NotEnrolled,

    #[error("not found: {0}")]
    NotFound(String),

    // storage
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
    #[error("storage error: {0}")]
    Storage(String),
}

impl ServiceError {
    pub fn not_found(entity: &str) -> Self { Self::NotFound(format!("{} not found", entity)) }

    pub fn forbidden(msg: impl Into<String>) -> Self { Self::Forbidden(msg.into()) }

    pub fn kind(&self) -> ErrorKind {
        use ServiceError::*;
        match self {
            InvalidEmail | WeakPassword { .. } | OutOfRange { .. } | InvalidDeadline | InvalidScore
            | ScoreOutOfRange { .. } | Validation(_) => ErrorKind::Validation,
            DuplicateUsername | DuplicateEmail | AlreadyEnrolled | AlreadySubmitted => ErrorKind::Conflict,
            Forbidden(_) | InvalidCredentials | InvalidToken => ErrorKind::Authorization,
            DeadlinePassed | EnrollmentLimitExceeded { .. } | NotEnrolled => ErrorKind::Policy,
            NotFound(_) => ErrorKind::NotFound,
            StorageUnavailable(_) | Storage(_) => ErrorKind::Storage,
        }
    }

    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        use ServiceError::*;
        match self {
            InvalidEmail => 1001,
            WeakPassword { .. } => 1002,
            OutOfRange { .. } => 1003,
            InvalidDeadline => 1004,
            InvalidScore => 1005,
            ScoreOutOfRange { .. } => 1006,
            Validation(_) => 1000,
            DuplicateUsername => 2001,
            DuplicateEmail => 2002,
            AlreadyEnrolled => 2003,
            AlreadySubmitted => 2004,
            Forbidden(_) => 3001,
            InvalidCredentials => 3002,
            InvalidToken => 3003,
            DeadlinePassed => 4001,
            EnrollmentLimitExceeded { .. } => 4002,
            NotEnrolled => 4003,
            NotFound(_) => 4040,
            StorageUnavailable(_) => 5001,
            Storage(_) => 5000,
        }
    }

    /// Only storage failures are worth another attempt; everything else is
    /// deterministic given the same input.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Storage
    }
}

impl From<DbErr> for ServiceError {
    fn from(e: DbErr) -> Self {
        match e {
            DbErr::ConnectionAcquire(_) | DbErr::Conn(_) => ServiceError::StorageUnavailable(e.to_string()),
            // SQLITE_BUSY from a writer outside this pool
            other if other.to_string().contains("database is locked") => {
                ServiceError::StorageUnavailable(other.to_string())
            }
            other => ServiceError::Storage(other.to_string()),
        }
    }
}

impl From<ModelError> for ServiceError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::Validation(msg) => ServiceError::Validation(msg),
            ModelError::Db(db) => db.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_taxonomy() {
        assert_eq!(ServiceError::InvalidEmail.kind(), ErrorKind::Validation);
        assert_eq!(ServiceError::ScoreOutOfRange { max: 100.0 }.kind(), ErrorKind::Validation);
        assert_eq!(ServiceError::AlreadySubmitted.kind(), ErrorKind::Conflict);
        assert_eq!(ServiceError::InvalidCredentials.kind(), ErrorKind::Authorization);
        assert_eq!(ServiceError::EnrollmentLimitExceeded { limit: 6 }.kind(), ErrorKind::Policy);
        assert_eq!(ServiceError::StorageUnavailable("timeout".into()).kind(), ErrorKind::Storage);
    }

    #[test]
    fn only_storage_is_retryable() {
        assert!(ServiceError::StorageUnavailable("x".into()).is_retryable());
        assert!(ServiceError::Storage("x".into()).is_retryable());
        assert!(!ServiceError::DuplicateUsername.is_retryable());
        assert!(!ServiceError::Forbidden("x".into()).is_retryable());
    }

    #[test]
    fn connection_errors_are_unavailable() {
        let e: ServiceError = DbErr::Conn(sea_orm::RuntimeErr::Internal("refused".into())).into();
        assert!(matches!(e, ServiceError::StorageUnavailable(_)));
        let e: ServiceError = DbErr::Custom("boom".into()).into();
        assert!(matches!(e, ServiceError::Storage(_)));
        let e: ServiceError = DbErr::Exec(sea_orm::RuntimeErr::Internal("(code: 5) database is locked".into())).into();
        assert!(matches!(e, ServiceError::StorageUnavailable(_)));
        let e: ServiceError = ModelError::validation("bad").into();
        assert!(matches!(e, ServiceError::Validation(_)));
    }
}
