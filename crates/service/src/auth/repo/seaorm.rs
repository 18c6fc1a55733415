use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use uuid::Uuid;

use models::user;
use crate::auth::domain::{AuthUser, NewUser};
use crate::auth::repository::AuthRepository;
use crate::errors::ServiceError;
use crate::storage::conflict_or_storage;

pub struct SeaOrmAuthRepository {
    pub db: DatabaseConnection,
}

impl SeaOrmAuthRepository {
    pub fn new(db: DatabaseConnection) -> Self { Self { db } }
}

fn to_domain(u: user::Model) -> AuthUser {
    AuthUser { id: u.id, username: u.username, email: u.email, role: u.role, password_hash: u.password_hash }
}

/// Postgres names the violated constraint, SQLite the column; both mention the field.
pub(crate) fn duplicate_user_error(msg: &str) -> ServiceError {
    if msg.to_lowercase().contains("email") {
        ServiceError::DuplicateEmail
    } else {
        ServiceError::DuplicateUsername
    }
}

#[async_trait::async_trait]
impl AuthRepository for SeaOrmAuthRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<AuthUser>, ServiceError> {
        let res = user::Entity::find().filter(user::Column::Username.eq(username)).one(&self.db).await?;
        Ok(res.map(to_domain))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<AuthUser>, ServiceError> {
        let res = user::Entity::find().filter(user::Column::Email.eq(email)).one(&self.db).await?;
        Ok(res.map(to_domain))
    }

    async fn find_by_login(&self, username_or_email: &str) -> Result<Option<AuthUser>, ServiceError> {
        Ok(user::find_by_login(&self.db, username_or_email).await?.map(to_domain))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<AuthUser>, ServiceError> {
        Ok(user::Entity::find_by_id(id).one(&self.db).await?.map(to_domain))
    }

    async fn create_user(&self, input: NewUser) -> Result<AuthUser, ServiceError> {
        match user::create(&self.db, &input.username, &input.email, input.password_hash, input.role).await {
            Ok(created) => Ok(to_domain(created)),
            Err(models::errors::ModelError::Db(e)) => Err(conflict_or_storage(e, duplicate_user_error)),
            Err(e) => Err(e.into()),
        }
    }
}
