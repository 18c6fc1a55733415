use chrono::Duration;
use sea_orm::{EntityTrait, PaginatorTrait, TransactionTrait};
use tracing::info;

use models::user::{self, Role};
use models::{assignment, course, enrollment};

use super::AcademicService;
use crate::auth::password::hash_password;
use crate::errors::ServiceError;

const DEMO_ACCOUNTS: [(&str, &str, &str, Role); 3] = [
    ("admin1", "admin1@example.com", "admin123", Role::Admin),
    ("instructor1", "instructor1@example.com", "instructor123", Role::Instructor),
    ("student1", "student1@example.com", "student123", Role::Student),
];

impl AcademicService {
    /// Populate an empty store with a small demo dataset. Returns `false` and
    /// touches nothing when any user already exists.
    pub async fn seed_demo_data(&self) -> Result<bool, ServiceError> {
        if user::Entity::find().count(&self.db).await? > 0 {
            return Ok(false);
        }
        let mut hashes = Vec::with_capacity(DEMO_ACCOUNTS.len());
        for (_, _, password, _) in DEMO_ACCOUNTS {
            let password = password.to_string();
            let h = tokio::task::spawn_blocking(move || hash_password(&password))
                .await
                .map_err(|e| ServiceError::Storage(format!("hashing task failed: {e}")))??;
            hashes.push(h);
        }

        let now = self.now();
        let txn = self.db.begin().await?;
        let mut created = Vec::with_capacity(DEMO_ACCOUNTS.len());
        for ((username, email, _, role), hash) in DEMO_ACCOUNTS.into_iter().zip(hashes) {
            created.push(user::create(&txn, username, email, hash, role).await?);
        }
        let instructor = created[1].id;
        let student = created[2].id;
        let intro = course::create(&txn, instructor, "Introduction to Programming", "Variables, control flow and functions.").await?;
        course::create(&txn, instructor, "Data Structures", "Lists, trees, hash maps and their costs.").await?;
        enrollment::create(&txn, student, intro.id).await?;
        assignment::create(&txn, intro.id, "Hello World", "Write and run your first program.", 100.0, now + Duration::days(7), now)
            .await?;
        txn.commit().await?;
        info!(users = created.len(), "demo data seeded");
        Ok(true)
    }
}
