use sea_orm::{entity::prelude::*, ConnectionTrait, Set};
use uuid::Uuid;
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::course;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "assignments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    #[sea_orm(column_type = "Double")]
    pub max_score: f64,
    pub deadline: DateTimeWithTimeZone,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Course }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Course => Entity::belongs_to(course::Entity).from(Column::CourseId).to(course::Column::Id).into(),
        }
    }
}

impl Related<course::Entity> for Entity {
    fn to() -> RelationDef { Relation::Course.def() }
}

impl ActiveModelBehavior for ActiveModel {}

pub const TITLE_MAX: usize = 100;

pub fn validate_title(title: &str) -> Result<(), ModelError> {
    let t = title.trim();
    if t.is_empty() { return Err(ModelError::validation("assignment title required")); }
    if t.chars().count() > TITLE_MAX { return Err(ModelError::validation("assignment title too long")); }
    Ok(())
}

pub async fn create<C: ConnectionTrait>(
    db: &C,
    course_id: Uuid,
    title: &str,
    description: &str,
    max_score: f64,
    deadline: DateTimeWithTimeZone,
    created_at: DateTimeWithTimeZone,
) -> Result<Model, ModelError> {
    validate_title(title)?;
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        course_id: Set(course_id),
        title: Set(title.trim().to_string()),
        description: Set(description.to_string()),
        max_score: Set(max_score),
        deadline: Set(deadline),
        created_at: Set(created_at),
    };
    Ok(am.insert(db).await?)
}
