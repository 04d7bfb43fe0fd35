//! # Order Query Repository
//!
//! View-shaped projection queries, kept apart from the entity repository:
//! queries tailored to one view couple the SQL to that exact shape, so
//! they don't belong next to the reusable entity operations.
//!
//! ## The Three Projection Paths
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  find_order_views           1 parent query + 1 child query per order   │
//! │  find_order_views_batched   1 parent query + 1 IN query for all        │
//! │  find_order_views_flat      exactly 1 wide join, regrouped in memory   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! None of these materialize entities: rows land directly in view DTOs,
//! cheaper on the database at the cost of coupling to the view shape.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use crate::repository::order::{push_filters, OrderSearch, Page};
use shop_core::view::{group_flat_rows, OrderFlatRow, OrderItemView, OrderView};
use shop_core::{Address, OrderStatus};

/// Parent-shaped projection row: one per order.
#[derive(Debug, sqlx::FromRow)]
struct ParentRow {
    order_id: String,
    member_name: String,
    order_date: DateTime<Utc>,
    status: OrderStatus,
    city: String,
    street: String,
    zipcode: String,
}

impl From<ParentRow> for OrderView {
    fn from(row: ParentRow) -> Self {
        OrderView {
            order_id: row.order_id,
            member_name: row.member_name,
            order_date: row.order_date,
            status: row.status,
            address: Address::new(row.city, row.street, row.zipcode),
            order_items: Vec::new(),
        }
    }
}

/// Child-shaped projection row, tagged with its parent order id.
#[derive(Debug, sqlx::FromRow)]
struct ChildRow {
    order_id: String,
    item_name: String,
    order_price: i64,
    count: i64,
}

/// Repository for view-shaped order projections.
#[derive(Debug, Clone)]
pub struct OrderQueryRepository {
    pool: SqlitePool,
}

impl OrderQueryRepository {
    /// Creates a new OrderQueryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderQueryRepository { pool }
    }

    /// Direct DTO projection: one parent query, then one child query per
    /// order. Simple and fine for small result sets; the per-order child
    /// queries are this path's known cost.
    pub async fn find_order_views(
        &self,
        search: &OrderSearch,
        page: Option<Page>,
    ) -> DbResult<Vec<OrderView>> {
        let mut views = self.fetch_parents(search, page).await?;

        for view in &mut views {
            let children: Vec<ChildRow> = sqlx::query_as(
                r#"
                SELECT oi.order_id, i.name AS item_name, oi.order_price, oi.count
                FROM order_items oi
                JOIN items i ON i.id = oi.item_id
                WHERE oi.order_id = ?1
                ORDER BY oi.line_no
                "#,
            )
            .bind(&view.order_id)
            .fetch_all(&self.pool)
            .await?;

            view.order_items = children
                .into_iter()
                .map(|child| OrderItemView {
                    item_name: child.item_name,
                    order_price: child.order_price,
                    count: child.count,
                })
                .collect();
        }

        Ok(views)
    }

    /// Collection-optimized DTO projection: one parent query, then every
    /// child for the whole result set in a single `IN` query, distributed
    /// to parents from an in-memory map.
    pub async fn find_order_views_batched(
        &self,
        search: &OrderSearch,
        page: Option<Page>,
    ) -> DbResult<Vec<OrderView>> {
        let mut views = self.fetch_parents(search, page).await?;
        if views.is_empty() {
            return Ok(views);
        }

        let mut qb = QueryBuilder::<Sqlite>::new(
            r#"
            SELECT oi.order_id, i.name AS item_name, oi.order_price, oi.count
            FROM order_items oi
            JOIN items i ON i.id = oi.item_id
            WHERE oi.order_id IN (
            "#,
        );
        {
            let mut separated = qb.separated(", ");
            for view in &views {
                separated.push_bind(view.order_id.clone());
            }
        }
        qb.push(") ORDER BY oi.order_id, oi.line_no");

        let children: Vec<ChildRow> = qb.build_query_as().fetch_all(&self.pool).await?;

        debug!(parents = views.len(), children = children.len(), "Distributing batched children");

        let mut by_order: HashMap<String, Vec<OrderItemView>> = HashMap::new();
        for child in children {
            by_order
                .entry(child.order_id)
                .or_default()
                .push(OrderItemView {
                    item_name: child.item_name,
                    order_price: child.order_price,
                    count: child.count,
                });
        }

        for view in &mut views {
            if let Some(items) = by_order.remove(&view.order_id) {
                view.order_items = items;
            }
        }

        Ok(views)
    }

    /// Flat-row projection: exactly one wide query joining order, member,
    /// delivery, line, and item, one row per (order, line) pair, regrouped
    /// by the pure flattener. Never paged by order.
    pub async fn find_order_views_flat(&self, search: &OrderSearch) -> DbResult<Vec<OrderView>> {
        let mut qb = QueryBuilder::<Sqlite>::new(
            r#"
            SELECT o.id AS order_id, m.name AS member_name, o.order_date, o.status,
                   d.city, d.street, d.zipcode,
                   i.name AS item_name, oi.order_price, oi.count
            FROM orders o
            JOIN members m ON m.id = o.member_id
            JOIN deliveries d ON d.order_id = o.id
            JOIN order_items oi ON oi.order_id = o.id
            JOIN items i ON i.id = oi.item_id
            "#,
        );
        push_filters(&mut qb, search);
        qb.push(" ORDER BY o.order_date, o.id, oi.line_no");

        let rows: Vec<OrderFlatRow> = qb.build_query_as().fetch_all(&self.pool).await?;

        Ok(group_flat_rows(rows))
    }

    /// The shared parent projection: order id, member name, date, status,
    /// and the delivery address, one row per order, pageable.
    async fn fetch_parents(
        &self,
        search: &OrderSearch,
        page: Option<Page>,
    ) -> DbResult<Vec<OrderView>> {
        let mut qb = QueryBuilder::<Sqlite>::new(
            r#"
            SELECT o.id AS order_id, m.name AS member_name, o.order_date, o.status,
                   d.city, d.street, d.zipcode
            FROM orders o
            JOIN members m ON m.id = o.member_id
            JOIN deliveries d ON d.order_id = o.id
            "#,
        );
        push_filters(&mut qb, search);
        qb.push(" ORDER BY o.order_date, o.id");
        if let Some(page) = page {
            qb.push(" LIMIT ")
                .push_bind(page.limit)
                .push(" OFFSET ")
                .push_bind(page.offset);
        }

        let rows: Vec<ParentRow> = qb.build_query_as().fetch_all(&self.pool).await?;

        Ok(rows.into_iter().map(OrderView::from).collect())
    }
}
