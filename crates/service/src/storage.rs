//! Bounded storage access and database error translation.

use std::future::Future;
use std::time::{Duration, Instant};

use common::observability::{OPERATIONS_TOTAL, OPERATION_DURATION, STORAGE_TIMEOUTS_TOTAL};
use sea_orm::{DbErr, SqlErr};
use tracing::warn;

use crate::errors::ServiceError;

/// Run one service operation with an upper bound on how long storage may take.
///
/// A timed-out future is dropped, which rolls back any open transaction it held.
pub async fn bounded<T, F>(operation: &'static str, limit: Duration, fut: F) -> Result<T, ServiceError>
where
    F: Future<Output = Result<T, ServiceError>>,
{
    let started = Instant::now();
    let res = match tokio::time::timeout(limit, fut).await {
        Ok(res) => res,
        Err(_) => {
            STORAGE_TIMEOUTS_TOTAL.inc();
            warn!(operation, limit_ms = limit.as_millis() as u64, "storage operation timed out");
            Err(ServiceError::StorageUnavailable(format!("{operation} timed out after {}ms", limit.as_millis())))
        }
    };
    OPERATION_DURATION.with_label_values(&[operation]).observe(started.elapsed().as_secs_f64());
    let outcome = match &res {
        Ok(_) => "ok",
        Err(e) if e.is_retryable() => "storage_error",
        Err(_) => "rejected",
    };
    OPERATIONS_TOTAL.with_label_values(&[operation, outcome]).inc();
    res
}

/// Constraint name/message of a unique violation, if that is what `err` is.
pub fn unique_violation(err: &DbErr) -> Option<String> {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(msg)) => Some(msg),
        _ => None,
    }
}

/// Translate a failed insert: unique violations become the operation's
/// conflict error, everything else goes through the generic mapping.
pub fn conflict_or_storage(err: DbErr, conflict: impl FnOnce(&str) -> ServiceError) -> ServiceError {
    match unique_violation(&err) {
        Some(msg) => conflict(&msg),
        None => err.into(),
    }
}
