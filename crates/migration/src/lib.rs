//! Migrator registering entity-specific migrations in dependency order.
//! Indexes are applied last.
pub use sea_orm_migration::prelude::*;

mod m20240901_000001_create_users;
mod m20240901_000002_create_courses;
mod m20240901_000003_create_enrollments;
mod m20240901_000004_create_assignments;
mod m20240901_000005_create_submissions;
mod m20240901_000006_create_audit_logs;
mod m20240901_000007_add_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240901_000001_create_users::Migration),
            Box::new(m20240901_000002_create_courses::Migration),
            Box::new(m20240901_000003_create_enrollments::Migration),
            Box::new(m20240901_000004_create_assignments::Migration),
            Box::new(m20240901_000005_create_submissions::Migration),
            Box::new(m20240901_000006_create_audit_logs::Migration),
            // Indexes should always be applied last
            Box::new(m20240901_000007_add_indexes::Migration),
        ]
    }
}
