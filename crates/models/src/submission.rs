use sea_orm::{entity::prelude::*, ConnectionTrait, Set};
use uuid::Uuid;
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::{assignment, user};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "submissions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub assignment_id: Uuid,
    pub student_id: Uuid,
    #[sea_orm(column_type = "Text", nullable)]
    pub content: Option<String>,
    pub file_name: Option<String>,
    #[sea_orm(column_type = "Double", nullable)]
    pub score: Option<f64>,
    #[sea_orm(column_type = "Text", nullable)]
    pub feedback: Option<String>,
    pub submitted_at: DateTimeWithTimeZone,
    pub graded_at: Option<DateTimeWithTimeZone>,
}

impl Model {
    pub fn is_graded(&self) -> bool { self.score.is_some() }
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Assignment, Student }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Assignment => Entity::belongs_to(assignment::Entity).from(Column::AssignmentId).to(assignment::Column::Id).into(),
            Relation::Student => Entity::belongs_to(user::Entity).from(Column::StudentId).to(user::Column::Id).into(),
        }
    }
}

impl Related<assignment::Entity> for Entity {
    fn to() -> RelationDef { Relation::Assignment.def() }
}

impl ActiveModelBehavior for ActiveModel {}

/// What a student hands in: inline text or the name of an attached file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Payload {
    Content(String),
    File(String),
}

impl Payload {
    /// Exactly one of the two must be present and non-blank.
    pub fn from_parts(content: Option<String>, file_name: Option<String>) -> Result<Self, ModelError> {
        let content = content.filter(|c| !c.trim().is_empty());
        let file_name = file_name.filter(|f| !f.trim().is_empty());
        match (content, file_name) {
            (Some(c), None) => Ok(Payload::Content(c)),
            (None, Some(f)) => {
                if f.chars().count() > 255 { return Err(ModelError::validation("file name too long")); }
                Ok(Payload::File(f))
            }
            (Some(_), Some(_)) => Err(ModelError::validation("supply either content or a file, not both")),
            (None, None) => Err(ModelError::validation("submission content or file required")),
        }
    }
}

pub async fn create<C: ConnectionTrait>(
    db: &C,
    assignment_id: Uuid,
    student_id: Uuid,
    payload: Payload,
    submitted_at: DateTimeWithTimeZone,
) -> Result<Model, ModelError> {
    let (content, file_name) = match payload {
        Payload::Content(c) => (Some(c), None),
        Payload::File(f) => (None, Some(f)),
    };
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        assignment_id: Set(assignment_id),
        student_id: Set(student_id),
        content: Set(content),
        file_name: Set(file_name),
        score: Set(None),
        feedback: Set(None),
        submitted_at: Set(submitted_at),
        graded_at: Set(None),
    };
    Ok(am.insert(db).await?)
}

pub async fn find_for_pair<C: ConnectionTrait>(db: &C, assignment_id: Uuid, student_id: Uuid) -> Result<Option<Model>, ModelError> {
    Ok(Entity::find()
        .filter(Column::AssignmentId.eq(assignment_id))
        .filter(Column::StudentId.eq(student_id))
        .one(db)
        .await?)
}
