use sea_orm::{entity::prelude::*, ConnectionTrait, Set};
use uuid::Uuid;
use serde::{Deserialize, Serialize};
use validator::ValidateEmail;

use crate::errors::ModelError;

/// Fixed role set; a user's role never changes after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[sea_orm(string_value = "admin")]
    Admin,
    #[sea_orm(string_value = "instructor")]
    Instructor,
    #[sea_orm(string_value = "student")]
    Student,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Instructor => "instructor",
            Role::Student => "student",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub username: String,
    #[sea_orm(unique)]
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef { match *self {} }
}

impl ActiveModelBehavior for ActiveModel {}

pub const USERNAME_MAX: usize = 50;
pub const EMAIL_MAX: usize = 100;

pub fn validate_username(username: &str) -> Result<(), ModelError> {
    let u = username.trim();
    if u.is_empty() { return Err(ModelError::validation("username required")); }
    if u.chars().count() > USERNAME_MAX { return Err(ModelError::validation("username too long")); }
    if !u.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')) {
        return Err(ModelError::validation("username may only contain letters, digits, '_', '.', '-'"));
    }
    Ok(())
}

/// Standard address syntax plus a dotted domain, matching what the desktop
/// registration form always required.
pub fn validate_email(email: &str) -> Result<(), ModelError> {
    let e = email.trim();
    if e.len() > EMAIL_MAX || !e.validate_email() {
        return Err(ModelError::validation("invalid email"));
    }
    let domain = e.rsplit_once('@').map(|(_, d)| d).unwrap_or_default();
    let tld_ok = domain
        .rsplit_once('.')
        .map(|(host, tld)| !host.is_empty() && tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic()))
        .unwrap_or(false);
    if !tld_ok { return Err(ModelError::validation("invalid email")); }
    Ok(())
}

/// Insert a user row. The caller supplies an already-hashed credential.
pub async fn create<C: ConnectionTrait>(
    db: &C,
    username: &str,
    email: &str,
    password_hash: String,
    role: Role,
) -> Result<Model, ModelError> {
    validate_username(username)?;
    validate_email(email)?;
    if password_hash.trim().is_empty() { return Err(ModelError::validation("password hash required")); }
    let now = crate::utc_now();
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        username: Set(username.trim().to_string()),
        email: Set(email.trim().to_string()),
        password_hash: Set(password_hash),
        role: Set(role),
        created_at: Set(now),
        updated_at: Set(now),
    };
    Ok(am.insert(db).await?)
}

/// Look a user up by username first, then by email.
pub async fn find_by_login<C: ConnectionTrait>(db: &C, username_or_email: &str) -> Result<Option<Model>, ModelError> {
    let key = username_or_email.trim();
    if let Some(u) = Entity::find().filter(Column::Username.eq(key)).one(db).await? {
        return Ok(Some(u));
    }
    Ok(Entity::find().filter(Column::Email.eq(key)).one(db).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_syntax() {
        assert!(validate_email("alice@x.com").is_ok());
        assert!(validate_email("first.last+tag@uni.example.org").is_ok());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("a@localhost").is_err());
        assert!(validate_email("a@b.c").is_err());
        assert!(validate_email("@x.com").is_err());
    }

    #[test]
    fn username_rules() {
        assert!(validate_username("alice_01").is_ok());
        assert!(validate_username("  ").is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_username(&"x".repeat(51)).is_err());
    }

    #[test]
    fn role_labels() {
        assert_eq!(Role::Instructor.to_string(), "instructor");
        assert_eq!(Role::try_from_value(&"admin".to_string()).ok(), Some(Role::Admin));
        assert!(Role::try_from_value(&"professor".to_string()).is_err());
    }
}
