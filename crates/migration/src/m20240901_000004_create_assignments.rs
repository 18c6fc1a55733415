//! Create `assignments` table; each row belongs to exactly one course.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Assignments::Table)
                    .if_not_exists()
                    .col(uuid(Assignments::Id).primary_key())
                    .col(uuid(Assignments::CourseId).not_null())
                    .col(string_len(Assignments::Title, 100).not_null())
                    .col(text(Assignments::Description).not_null())
                    .col(double(Assignments::MaxScore).not_null())
                    .col(timestamp_with_time_zone(Assignments::Deadline).not_null())
                    .col(timestamp_with_time_zone(Assignments::CreatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_assignments_course")
                            .from(Assignments::Table, Assignments::CourseId)
                            .to(Courses::Table, Courses::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Assignments::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Assignments { Table, Id, CourseId, Title, Description, MaxScore, Deadline, CreatedAt }

#[derive(DeriveIden)]
enum Courses { Table, Id }
