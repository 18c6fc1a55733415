//! Auth module: three-layer architecture (domain, repository, service).
//!
//! Registration, login, session tokens and logout live here; the password
//! policy is in `password`.

pub mod domain;
pub mod password;
pub mod repository;
pub mod service;
pub mod repo;

pub use service::{AuthConfig, AuthService};
