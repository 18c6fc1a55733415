//! Persistent entities of the academic records store.
//!
//! Each module holds one SeaORM entity plus the row-level validation and
//! insert helpers that every writer goes through. Business rules that span
//! rows (limits, ownership, deadlines) belong to the `service` crate.

pub mod errors;
pub mod db;
pub mod user;
pub mod course;
pub mod enrollment;
pub mod assignment;
pub mod submission;
pub mod audit_log;

pub use sea_orm::prelude::DateTimeWithTimeZone;

/// Current instant normalised to UTC, the only offset this store writes.
pub fn utc_now() -> DateTimeWithTimeZone {
    chrono::Utc::now().fixed_offset()
}

#[cfg(test)]
mod tests;
