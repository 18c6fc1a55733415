//! Page selection for the admin listings (users, audit log).

use sea_orm::{ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, Select};
use serde::Deserialize;

pub const DEFAULT_PER_PAGE: u32 = 20;
pub const MAX_PER_PAGE: u32 = 100;

/// 1-based page request. Deserializes straight from a query string; absent
/// fields take the defaults.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

impl Default for Pagination {
    fn default() -> Self { Self { page: 1, per_page: DEFAULT_PER_PAGE } }
}

impl Pagination {
    pub fn new(page: u32, per_page: u32) -> Self { Self { page, per_page } }

    /// Zero-based page index and a page size within `1..=MAX_PER_PAGE`.
    pub fn bounds(self) -> (u64, u64) {
        let index = self.page.max(1) - 1;
        (u64::from(index), u64::from(self.per_page.clamp(1, MAX_PER_PAGE)))
    }

    /// Run `select` and return only this page of it.
    pub async fn fetch<C, E>(self, db: &C, select: Select<E>) -> Result<Vec<E::Model>, DbErr>
    where
        C: ConnectionTrait,
        E: EntityTrait,
        E::Model: Send + Sync + 'static,
    {
        let (index, size) = self.bounds();
        select.paginate(db, size).fetch_page(index).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::user::{self, Role};
    use sea_orm::QueryOrder;

    use crate::test_support::get_db;

    #[test]
    fn page_zero_reads_as_first_page() {
        assert_eq!(Pagination::new(0, 5).bounds(), (0, 5));
        assert_eq!(Pagination::new(1, 5).bounds(), Pagination::new(0, 5).bounds());
    }

    #[test]
    fn page_size_is_capped() {
        assert_eq!(Pagination::new(3, 0).bounds(), (2, 1));
        assert_eq!(Pagination::new(3, 5_000).bounds(), (2, u64::from(MAX_PER_PAGE)));
    }

    #[tokio::test]
    async fn fetch_walks_users_in_order() -> anyhow::Result<()> {
        let db = get_db().await?;
        for name in ["carol", "alice", "bob"] {
            user::create(&db, name, &format!("{name}@example.com"), "$argon2id$stub".into(), Role::Student).await?;
        }
        let by_name = || user::Entity::find().order_by_asc(user::Column::Username);

        let first = Pagination::new(1, 2).fetch(&db, by_name()).await?;
        let names: Vec<_> = first.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, ["alice", "bob"]);

        let second = Pagination::new(2, 2).fetch(&db, by_name()).await?;
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].username, "carol");

        assert!(Pagination::new(3, 2).fetch(&db, by_name()).await?.is_empty());
        Ok(())
    }
}
