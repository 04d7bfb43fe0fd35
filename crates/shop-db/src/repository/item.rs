//! # Item Repository
//!
//! Database operations for catalog items and their stock.
//!
//! ## Stock Serialization
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              Why the guarded UPDATE matters                             │
//! │                                                                         │
//! │  Two concurrent orders for the last 3 units:                           │
//! │                                                                         │
//! │  tx A: UPDATE items SET stock_quantity = stock_quantity - 3            │
//! │        WHERE id = ? AND stock_quantity >= 3        → 1 row, commits    │
//! │  tx B: same statement                              → 0 rows            │
//! │        └── 0 rows + item exists  →  InsufficientStock                  │
//! │                                                                         │
//! │  The check and the decrement are one statement, serialized by the      │
//! │  storage engine. Two writers can never both pass the non-negative      │
//! │  check and oversell.                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Items are polymorphic (Book/Movie) over a single table: a discriminator
//! column plus nullable variant columns, mapped to `ItemKind` here.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use shop_core::{CoreError, Item, ItemKind};

/// Row shape for the single-table item layout.
#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    id: String,
    item_kind: String,
    name: String,
    price: i64,
    stock_quantity: i64,
    author: Option<String>,
    isbn: Option<String>,
    actor: Option<String>,
    director: Option<String>,
}

impl TryFrom<ItemRow> for Item {
    type Error = DbError;

    fn try_from(row: ItemRow) -> Result<Item, DbError> {
        let kind = match row.item_kind.as_str() {
            "BOOK" => ItemKind::Book {
                author: row.author.unwrap_or_default(),
                isbn: row.isbn.unwrap_or_default(),
            },
            "MOVIE" => ItemKind::Movie {
                actor: row.actor.unwrap_or_default(),
                director: row.director.unwrap_or_default(),
            },
            other => {
                return Err(DbError::Internal(format!(
                    "unknown item discriminator '{other}' for item {}",
                    row.id
                )))
            }
        };

        Ok(Item {
            id: row.id,
            name: row.name,
            price: row.price,
            stock_quantity: row.stock_quantity,
            kind,
        })
    }
}

const SELECT_ITEM: &str = r#"
    SELECT id, item_kind, name, price, stock_quantity,
           author, isbn, actor, director
    FROM items
"#;

/// Repository for item database operations.
#[derive(Debug, Clone)]
pub struct ItemRepository {
    pool: SqlitePool,
}

impl ItemRepository {
    /// Creates a new ItemRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ItemRepository { pool }
    }

    /// Inserts an item.
    pub async fn insert(&self, item: &Item) -> DbResult<()> {
        debug!(id = %item.id, name = %item.name, kind = item.kind.discriminator(), "Inserting item");

        let (author, isbn, actor, director) = match &item.kind {
            ItemKind::Book { author, isbn } => (Some(author), Some(isbn), None, None),
            ItemKind::Movie { actor, director } => (None, None, Some(actor), Some(director)),
        };

        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO items (
                id, item_kind, name, price, stock_quantity,
                author, isbn, actor, director, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&item.id)
        .bind(item.kind.discriminator())
        .bind(&item.name)
        .bind(item.price)
        .bind(item.stock_quantity)
        .bind(author)
        .bind(isbn)
        .bind(actor)
        .bind(director)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets an item by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Item>> {
        let row: Option<ItemRow> = sqlx::query_as(&format!("{SELECT_ITEM} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Item::try_from).transpose()
    }

    /// Lists all items.
    pub async fn list(&self) -> DbResult<Vec<Item>> {
        let rows: Vec<ItemRow> = sqlx::query_as(&format!("{SELECT_ITEM} ORDER BY created_at"))
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Item::try_from).collect()
    }

    /// Updates an item's listing (name and price) as an explicit command.
    ///
    /// Stock is deliberately excluded: it moves only through
    /// [`ItemRepository::add_stock`] and [`ItemRepository::remove_stock`].
    pub async fn update_listing(&self, id: &str, name: &str, price: i64) -> DbResult<()> {
        let result = sqlx::query("UPDATE items SET name = ?2, price = ?3 WHERE id = ?1")
            .bind(id)
            .bind(name)
            .bind(price)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Item", id));
        }

        Ok(())
    }

    /// Credits stock (manual restock or cancellation reversal).
    pub async fn add_stock(&self, id: &str, quantity: i64) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        credit_stock(&mut conn, id, quantity).await
    }

    /// Debits stock with the atomic check-then-set guard.
    ///
    /// ## Errors
    /// - [`DbError::NotFound`] when the item doesn't exist
    /// - `InsufficientStock` (via [`DbError::Domain`]) when the debit would
    ///   push stock negative; stock is left unchanged
    pub async fn remove_stock(&self, id: &str, quantity: i64) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        debit_stock(&mut conn, id, quantity).await
    }
}

// =============================================================================
// Connection-Level Stock Mutators
// =============================================================================
// Shared with OrderRepository so order creation and cancellation can run
// these inside their own transaction.

/// Debits stock on the given connection; check and decrement are a single
/// guarded UPDATE.
pub(crate) async fn debit_stock(
    conn: &mut SqliteConnection,
    item_id: &str,
    quantity: i64,
) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE items
        SET stock_quantity = stock_quantity - ?2
        WHERE id = ?1 AND stock_quantity >= ?2
        "#,
    )
    .bind(item_id)
    .bind(quantity)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 1 {
        return Ok(());
    }

    // Zero rows: missing item or not enough stock. Tell them apart.
    let current: Option<(String, i64)> =
        sqlx::query_as("SELECT name, stock_quantity FROM items WHERE id = ?1")
            .bind(item_id)
            .fetch_optional(&mut *conn)
            .await?;

    match current {
        None => Err(DbError::not_found("Item", item_id)),
        Some((name, available)) => Err(DbError::Domain(CoreError::InsufficientStock {
            item: name,
            available,
            requested: quantity,
        })),
    }
}

/// Credits stock on the given connection. Unconditional, no upper bound.
pub(crate) async fn credit_stock(
    conn: &mut SqliteConnection,
    item_id: &str,
    quantity: i64,
) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE items
        SET stock_quantity = stock_quantity + ?2
        WHERE id = ?1
        "#,
    )
    .bind(item_id)
    .bind(quantity)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Item", item_id));
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
