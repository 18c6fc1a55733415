use sea_orm::{entity::prelude::*, ConnectionTrait, Set};
use uuid::Uuid;
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::user;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "courses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub instructor_id: Uuid,
    #[sea_orm(column_type = "Double")]
    pub progress: f64,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Instructor }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Instructor => Entity::belongs_to(user::Entity).from(Column::InstructorId).to(user::Column::Id).into(),
        }
    }
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef { Relation::Instructor.def() }
}

impl ActiveModelBehavior for ActiveModel {}

pub const NAME_MAX: usize = 100;

pub fn validate_name(name: &str) -> Result<(), ModelError> {
    let n = name.trim();
    if n.is_empty() { return Err(ModelError::validation("course name required")); }
    if n.chars().count() > NAME_MAX { return Err(ModelError::validation("course name too long")); }
    Ok(())
}

/// Progress fractions live in the closed unit interval; NaN is rejected.
pub fn progress_in_range(p: f64) -> bool {
    (0.0..=1.0).contains(&p)
}

pub async fn create<C: ConnectionTrait>(db: &C, instructor_id: Uuid, name: &str, description: &str) -> Result<Model, ModelError> {
    validate_name(name)?;
    let now = crate::utc_now();
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.trim().to_string()),
        description: Set(description.to_string()),
        instructor_id: Set(instructor_id),
        progress: Set(0.0),
        created_at: Set(now),
        updated_at: Set(now),
    };
    Ok(am.insert(db).await?)
}
