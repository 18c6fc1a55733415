//! Create `courses` table with FK to the owning instructor.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Courses::Table)
                    .if_not_exists()
                    .col(uuid(Courses::Id).primary_key())
                    .col(string_len(Courses::Name, 100).not_null())
                    .col(text(Courses::Description).not_null())
                    .col(uuid(Courses::InstructorId).not_null())
                    .col(double(Courses::Progress).not_null().default(0.0))
                    .col(timestamp_with_time_zone(Courses::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Courses::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_courses_instructor")
                            .from(Courses::Table, Courses::InstructorId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Courses::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Courses { Table, Id, Name, Description, InstructorId, Progress, CreatedAt, UpdatedAt }

#[derive(DeriveIden)]
enum Users { Table, Id }
