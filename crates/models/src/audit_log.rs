use sea_orm::{entity::prelude::*, ConnectionTrait, Set};
use uuid::Uuid;
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

/// Append-only. `user_id` is a plain column so entries outlive the users they name
/// and failed logins for unknown accounts can still be recorded.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "audit_logs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub action: String,
    #[sea_orm(column_type = "Text")]
    pub details: String,
    pub timestamp: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef { match *self {} }
}

impl ActiveModelBehavior for ActiveModel {}

pub async fn append<C: ConnectionTrait>(
    db: &C,
    user_id: Option<Uuid>,
    action: &str,
    details: &str,
    timestamp: DateTimeWithTimeZone,
) -> Result<Model, ModelError> {
    if action.trim().is_empty() { return Err(ModelError::validation("audit action required")); }
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        action: Set(action.to_string()),
        details: Set(details.to_string()),
        timestamp: Set(timestamp),
    };
    Ok(am.insert(db).await?)
}
