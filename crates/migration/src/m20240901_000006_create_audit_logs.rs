//! Create append-only `audit_logs` table.
//!
//! No FK on `user_id`: failed logins have no actor, and entries must outlive
//! the users they mention.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AuditLogs::Table)
                    .if_not_exists()
                    .col(uuid(AuditLogs::Id).primary_key())
                    .col(uuid_null(AuditLogs::UserId))
                    .col(string_len(AuditLogs::Action, 100).not_null())
                    .col(text(AuditLogs::Details).not_null())
                    .col(timestamp_with_time_zone(AuditLogs::Timestamp).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(AuditLogs::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum AuditLogs { Table, Id, UserId, Action, Details, Timestamp }
