//! Create `submissions` table.
//! Content and file name are both nullable; score/feedback stay null until graded.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Submissions::Table)
                    .if_not_exists()
                    .col(uuid(Submissions::Id).primary_key())
                    .col(uuid(Submissions::AssignmentId).not_null())
                    .col(uuid(Submissions::StudentId).not_null())
                    .col(text_null(Submissions::Content))
                    .col(string_len_null(Submissions::FileName, 255))
                    .col(double_null(Submissions::Score))
                    .col(text_null(Submissions::Feedback))
                    .col(timestamp_with_time_zone(Submissions::SubmittedAt).not_null())
                    .col(timestamp_with_time_zone_null(Submissions::GradedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_submissions_assignment")
                            .from(Submissions::Table, Submissions::AssignmentId)
                            .to(Assignments::Table, Assignments::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_submissions_student")
                            .from(Submissions::Table, Submissions::StudentId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Submissions::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Submissions {
    Table,
    Id,
    AssignmentId,
    StudentId,
    Content,
    FileName,
    Score,
    Feedback,
    SubmittedAt,
    GradedAt,
}

#[derive(DeriveIden)]
enum Assignments { Table, Id }

#[derive(DeriveIden)]
enum Users { Table, Id }
