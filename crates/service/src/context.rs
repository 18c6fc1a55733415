//! Caller identity passed explicitly into every operation.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use models::user::Role;

use crate::errors::ServiceError;

/// Authenticated identity of whoever invokes an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub user_id: Uuid,
    pub role: Role,
}

impl Caller {
    pub fn new(user_id: Uuid, role: Role) -> Self { Self { user_id, role } }

    pub fn is_admin(&self) -> bool { self.role == Role::Admin }

    pub fn require_admin(&self) -> Result<(), ServiceError> {
        if self.is_admin() { Ok(()) } else { Err(ServiceError::forbidden("admin role required")) }
    }

    pub fn require_student(&self) -> Result<(), ServiceError> {
        if self.role == Role::Student { Ok(()) } else { Err(ServiceError::forbidden("student role required")) }
    }

    pub fn require_staff(&self) -> Result<(), ServiceError> {
        match self.role {
            Role::Admin | Role::Instructor => Ok(()),
            Role::Student => Err(ServiceError::forbidden("instructor or admin role required")),
        }
    }

    /// Owner of a course, or an admin acting on its behalf.
    pub fn require_owner_or_admin(&self, owner_id: Uuid) -> Result<(), ServiceError> {
        if self.is_admin() || self.user_id == owner_id {
            Ok(())
        } else {
            Err(ServiceError::forbidden("not the course owner"))
        }
    }

    pub fn require_owner(&self, owner_id: Uuid) -> Result<(), ServiceError> {
        if self.user_id == owner_id { Ok(()) } else { Err(ServiceError::forbidden("not the course owner")) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_gates() {
        let owner = Uuid::new_v4();
        let admin = Caller::new(Uuid::new_v4(), Role::Admin);
        let prof = Caller::new(owner, Role::Instructor);
        let student = Caller::new(Uuid::new_v4(), Role::Student);

        assert!(admin.require_admin().is_ok());
        assert!(prof.require_admin().is_err());
        assert!(student.require_staff().is_err());
        assert!(prof.require_staff().is_ok());
        assert!(admin.require_owner_or_admin(owner).is_ok());
        assert!(admin.require_owner(owner).is_err());
        assert!(prof.require_owner(owner).is_ok());
        assert!(student.require_owner_or_admin(owner).is_err());
    }
}
