use async_trait::async_trait;
use uuid::Uuid;

use super::domain::{AuthUser, NewUser};
use crate::errors::ServiceError;

/// Repository abstraction for auth-related persistence.
#[async_trait]
pub trait AuthRepository: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<AuthUser>, ServiceError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<AuthUser>, ServiceError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<AuthUser>, ServiceError>;

    /// Must map uniqueness races to `DuplicateUsername` / `DuplicateEmail`.
    async fn create_user(&self, user: NewUser) -> Result<AuthUser, ServiceError>;

    async fn find_by_login(&self, username_or_email: &str) -> Result<Option<AuthUser>, ServiceError> {
        if let Some(u) = self.find_by_username(username_or_email).await? {
            return Ok(Some(u));
        }
        self.find_by_email(username_or_email).await
    }
}

/// Simple in-memory mock repository for tests and benches
pub mod mock {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MockAuthRepository {
        users: Mutex<Vec<AuthUser>>,
    }

    impl MockAuthRepository {
        fn snapshot(&self) -> Vec<AuthUser> {
            self.users.lock().unwrap_or_else(|p| p.into_inner()).clone()
        }

        pub fn len(&self) -> usize { self.snapshot().len() }

        pub fn is_empty(&self) -> bool { self.len() == 0 }
    }

    #[async_trait]
    impl AuthRepository for MockAuthRepository {
        async fn find_by_username(&self, username: &str) -> Result<Option<AuthUser>, ServiceError> {
            Ok(self.snapshot().into_iter().find(|u| u.username == username))
        }

        async fn find_by_email(&self, email: &str) -> Result<Option<AuthUser>, ServiceError> {
            Ok(self.snapshot().into_iter().find(|u| u.email == email))
        }

        async fn find_by_id(&self, id: Uuid) -> Result<Option<AuthUser>, ServiceError> {
            Ok(self.snapshot().into_iter().find(|u| u.id == id))
        }

        async fn create_user(&self, user: NewUser) -> Result<AuthUser, ServiceError> {
            let mut users = self.users.lock().unwrap_or_else(|p| p.into_inner());
            if users.iter().any(|u| u.username == user.username) {
                return Err(ServiceError::DuplicateUsername);
            }
            if users.iter().any(|u| u.email == user.email) {
                return Err(ServiceError::DuplicateEmail);
            }
            let created = AuthUser {
                id: Uuid::new_v4(),
                username: user.username,
                email: user.email,
                role: user.role,
                password_hash: user.password_hash,
            };
            users.push(created.clone());
            Ok(created)
        }
    }
}
