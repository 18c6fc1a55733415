use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Submissions: one per (assignment, student)
        manager
            .create_index(
                Index::create()
                    .name("uniq_submission_assignment_student")
                    .table(Submissions::Table)
                    .col(Submissions::AssignmentId)
                    .col(Submissions::StudentId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Courses: index on instructor_id
        manager
            .create_index(
                Index::create()
                    .name("idx_course_instructor")
                    .table(Courses::Table)
                    .col(Courses::InstructorId)
                    .to_owned(),
            )
            .await?;

        // Enrollments: reverse lookup by course
        manager
            .create_index(
                Index::create()
                    .name("idx_enrollment_course")
                    .table(Enrollments::Table)
                    .col(Enrollments::CourseId)
                    .to_owned(),
            )
            .await?;

        // Assignments: upcoming-deadline scans per course
        manager
            .create_index(
                Index::create()
                    .name("idx_assignment_course_deadline")
                    .table(Assignments::Table)
                    .col(Assignments::CourseId)
                    .col(Assignments::Deadline)
                    .to_owned(),
            )
            .await?;

        // AuditLogs: newest-first listing
        manager
            .create_index(
                Index::create()
                    .name("idx_audit_timestamp")
                    .table(AuditLogs::Table)
                    .col(AuditLogs::Timestamp)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("uniq_submission_assignment_student").table(Submissions::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_course_instructor").table(Courses::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_enrollment_course").table(Enrollments::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_assignment_course_deadline").table(Assignments::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_audit_timestamp").table(AuditLogs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Submissions { Table, AssignmentId, StudentId }

#[derive(DeriveIden)]
enum Courses { Table, InstructorId }

#[derive(DeriveIden)]
enum Enrollments { Table, CourseId }

#[derive(DeriveIden)]
enum Assignments { Table, CourseId, Deadline }

#[derive(DeriveIden)]
enum AuditLogs { Table, Timestamp }
