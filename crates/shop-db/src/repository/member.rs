//! # Member Repository
//!
//! Database operations for members.
//!
//! The member → orders back-reference is deliberately *not* stored here:
//! it is a derived view served by `OrderRepository::find_by_member`, so
//! ownership stays one-directional and there is no in-memory list to keep
//! consistent.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use shop_core::validation::validate_name;
use shop_core::{Address, Member};

/// Row shape for the members table.
#[derive(Debug, sqlx::FromRow)]
struct MemberRow {
    id: String,
    name: String,
    city: String,
    street: String,
    zipcode: String,
}

impl From<MemberRow> for Member {
    fn from(row: MemberRow) -> Self {
        Member {
            id: row.id,
            name: row.name,
            address: Address::new(row.city, row.street, row.zipcode),
        }
    }
}

/// Repository for member database operations.
#[derive(Debug, Clone)]
pub struct MemberRepository {
    pool: SqlitePool,
}

impl MemberRepository {
    /// Creates a new MemberRepository.
    pub fn new(pool: SqlitePool) -> Self {
        MemberRepository { pool }
    }

    /// Inserts a member.
    pub async fn insert(&self, member: &Member) -> DbResult<()> {
        validate_name(&member.name).map_err(shop_core::CoreError::from)?;

        debug!(id = %member.id, name = %member.name, "Inserting member");

        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO members (id, name, city, street, zipcode, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&member.id)
        .bind(&member.name)
        .bind(&member.address.city)
        .bind(&member.address.street)
        .bind(&member.address.zipcode)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a member by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Member>> {
        let row: Option<MemberRow> = sqlx::query_as(
            r#"
            SELECT id, name, city, street, zipcode
            FROM members
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Member::from))
    }

    /// Finds members by exact name.
    pub async fn find_by_name(&self, name: &str) -> DbResult<Vec<Member>> {
        let rows: Vec<MemberRow> = sqlx::query_as(
            r#"
            SELECT id, name, city, street, zipcode
            FROM members
            WHERE name = ?1
            ORDER BY created_at
            "#,
        )
        .bind(name)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Member::from).collect())
    }

    /// Lists all members.
    pub async fn list(&self) -> DbResult<Vec<Member>> {
        let rows: Vec<MemberRow> = sqlx::query_as(
            r#"
            SELECT id, name, city, street, zipcode
            FROM members
            ORDER BY created_at
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Member::from).collect())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::pool::{Database, DbConfig};
    use shop_core::{Address, Member};

    #[tokio::test]
    async fn test_insert_and_fetch_member() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.members();

        let member = Member::new("userA", Address::new("Seoul", "1", "111"));
        repo.insert(&member).await.unwrap();

        let fetched = repo.get_by_id(&member.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "userA");
        assert_eq!(fetched.address, member.address);

        let by_name = repo.find_by_name("userA").await.unwrap();
        assert_eq!(by_name.len(), 1);
        assert!(repo.get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_empty_member_name_is_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.members();

        let member = Member::new("", Address::new("Seoul", "1", "111"));
        assert!(repo.insert(&member).await.is_err());
    }
}
