//! # Order Repository
//!
//! Transactional order commands plus the retrieval-strategy family.
//!
//! ## The Strategy Family
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │          load_orders(filter, shape, page) → Vec<OrderView>              │
//! │                                                                         │
//! │  Shape                Queries                  Duplication   Paging    │
//! │  ──────────────────   ──────────────────────   ───────────   ──────    │
//! │  NaiveGraph           1 + O(orders) extra      none          yes       │
//! │  JoinFetchCollection  1 wide join + dedup      Σ(lines)      NO        │
//! │  JoinFetchBatched     1 + ceil(N/batch) IN     none          yes       │
//! │  Projection           1 + 1 per order          none          yes       │
//! │  ProjectionBatched    1 + 1 IN for all         none          yes       │
//! │  FlatProjection       exactly 1 + regroup      Σ(lines)      NO        │
//! │                                                                         │
//! │  All shapes return semantically identical results for the same         │
//! │  filter; they trade query count, payload size, duplication, and        │
//! │  pagination capability against each other. Callers choose              │
//! │  explicitly — nothing here auto-selects.                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Shapes whose row sets are duplicated per line item (JoinFetchCollection,
//! FlatProjection) reject pagination with `PaginationUnsupported` before
//! any query goes out: offset/limit over duplicated rows would silently
//! return wrong pages.
//!
//! ## Commands
//! `create_order` and `cancel_order` each run as one transaction with
//! all-or-nothing semantics; a failed stock debit or a completed delivery
//! rolls everything back.

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::item::{credit_stock, debit_stock};
use crate::repository::order_query::OrderQueryRepository;
use shop_core::validation::{validate_count, validate_price};
use shop_core::{
    Address, CoreError, Delivery, DeliveryStatus, Order, OrderItem, OrderItemView, OrderStatus,
    OrderView,
};

// =============================================================================
// Search Filter, Pagination, Fetch Shape
// =============================================================================

/// Criteria object for order retrieval.
#[derive(Debug, Clone, Default)]
pub struct OrderSearch {
    /// Restrict to a lifecycle status.
    pub status: Option<OrderStatus>,
    /// Substring match on the ordering member's name.
    pub member_name: Option<String>,
}

impl OrderSearch {
    /// Matches every order.
    pub fn any() -> Self {
        OrderSearch::default()
    }

    pub fn status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn member_name(mut self, name: impl Into<String>) -> Self {
        self.member_name = Some(name.into());
        self
    }
}

/// An offset/limit window over *orders* (never over joined rows).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub offset: i64,
    pub limit: i64,
}

impl Page {
    pub fn new(offset: i64, limit: i64) -> Self {
        Page { offset, limit }
    }
}

/// The retrieval strategy a caller selects explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchShape {
    /// Walk the entity graph with one query per relation per order.
    /// Simple, correct, pageable — and O(orders) extra round trips.
    NaiveGraph,
    /// One query joining member, delivery, lines, and items, with parent
    /// de-duplication in memory. Row count is Σ(lines), so no pagination.
    JoinFetchCollection,
    /// One query joining only the to-one relations (member, delivery) with
    /// pagination applied there, then the line collections loaded through
    /// `IN (id list)` queries sized by the batch size. The recommended
    /// general-purpose strategy.
    JoinFetchBatched,
    /// Skip entity materialization: one parent-shaped projection query plus
    /// one child query per order.
    Projection,
    /// Like [`FetchShape::Projection`], but all children fetched in a
    /// single `IN` query across the whole result set.
    ProjectionBatched,
    /// Exactly one wide join producing one row per (order, line) pair,
    /// regrouped in memory. Minimum query count, maximum duplication,
    /// no pagination.
    FlatProjection,
}

impl FetchShape {
    /// Whether offset/limit over orders is meaningful for this shape.
    pub fn supports_pagination(self) -> bool {
        !matches!(
            self,
            FetchShape::JoinFetchCollection | FetchShape::FlatProjection
        )
    }
}

// =============================================================================
// Order Lines (create input)
// =============================================================================

/// One requested line of a new order.
#[derive(Debug, Clone)]
pub struct OrderLine {
    pub item_id: String,
    /// Price to freeze for this line.
    pub order_price: i64,
    pub count: i64,
}

// =============================================================================
// Row Shapes
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: String,
    member_id: String,
    order_date: DateTime<Utc>,
    status: OrderStatus,
}

#[derive(Debug, sqlx::FromRow)]
struct DeliveryRow {
    id: String,
    city: String,
    street: String,
    zipcode: String,
    status: DeliveryStatus,
}

#[derive(Debug, sqlx::FromRow)]
struct LineRow {
    id: String,
    item_id: String,
    order_price: i64,
    count: i64,
}

/// To-one joined head row: order + member name + delivery, one row per order.
#[derive(Debug, sqlx::FromRow)]
struct OrderHeadRow {
    id: String,
    member_name: String,
    order_date: DateTime<Utc>,
    status: OrderStatus,
    city: String,
    street: String,
    zipcode: String,
}

/// Fully joined row for the fetch-join-collection shape: entity-level
/// fields plus the names the view needs, repeated once per line.
#[derive(Debug, sqlx::FromRow)]
struct JoinedRow {
    id: String,
    member_name: String,
    order_date: DateTime<Utc>,
    status: OrderStatus,
    city: String,
    street: String,
    zipcode: String,
    item_name: String,
    order_price: i64,
    count: i64,
}

/// Child row loaded by the batched-children queries.
#[derive(Debug, sqlx::FromRow)]
struct ChildRow {
    order_id: String,
    item_name: String,
    order_price: i64,
    count: i64,
}

// =============================================================================
// Repository
// =============================================================================

/// Default `IN (...)` list length for the batched-children strategy.
///
/// A tunable, not a constantly revalidated truth: it bounds the id-list
/// length per round trip, so total queries stay at roughly
/// `1 + ceil(order_count / batch_size)` regardless of line fan-out.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Repository for order commands and entity/view retrieval.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
    batch_size: usize,
}

impl OrderRepository {
    /// Creates a new OrderRepository with [`DEFAULT_BATCH_SIZE`].
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository {
            pool,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Overrides the batched-children `IN` list length.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Creates an order for `member_id` as one unit: order, delivery
    /// (address copied from the member), and all lines with their stock
    /// debits, in a single transaction.
    ///
    /// ## All-Or-Nothing
    /// If the k-th debit fails, the transaction rolls back and the first
    /// k-1 items show unchanged stock. No partial order is ever persisted.
    ///
    /// ## Errors
    /// - `EmptyOrder` / validation failures before any query
    /// - [`DbError::NotFound`] for an unknown member or item
    /// - `InsufficientStock` when a line overdraws its item
    pub async fn create_order(&self, member_id: &str, lines: &[OrderLine]) -> DbResult<String> {
        if lines.is_empty() {
            return Err(CoreError::EmptyOrder.into());
        }
        for line in lines {
            validate_price(line.order_price).map_err(CoreError::from)?;
            validate_count(line.count).map_err(CoreError::from)?;
        }

        let mut tx = self.pool.begin().await?;

        let address: Option<(String, String, String)> =
            sqlx::query_as("SELECT city, street, zipcode FROM members WHERE id = ?1")
                .bind(member_id)
                .fetch_optional(&mut *tx)
                .await?;
        let (city, street, zipcode) =
            address.ok_or_else(|| DbError::not_found("Member", member_id))?;

        let order_id = Uuid::new_v4().to_string();
        let delivery_id = Uuid::new_v4().to_string();
        let order_date = Utc::now();

        debug!(order_id = %order_id, member_id = %member_id, lines = lines.len(), "Creating order");

        sqlx::query(
            r#"
            INSERT INTO orders (id, member_id, order_date, status)
            VALUES (?1, ?2, ?3, 'ORDER')
            "#,
        )
        .bind(&order_id)
        .bind(member_id)
        .bind(order_date)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO deliveries (id, order_id, city, street, zipcode, status)
            VALUES (?1, ?2, ?3, ?4, ?5, 'READY')
            "#,
        )
        .bind(&delivery_id)
        .bind(&order_id)
        .bind(&city)
        .bind(&street)
        .bind(&zipcode)
        .execute(&mut *tx)
        .await?;

        for (line_no, line) in lines.iter().enumerate() {
            // Debit first: a failed debit aborts the whole transaction,
            // which also discards the order and earlier lines
            debit_stock(&mut tx, &line.item_id, line.count).await?;

            sqlx::query(
                r#"
                INSERT INTO order_items (id, order_id, item_id, order_price, count, line_no)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&order_id)
            .bind(&line.item_id)
            .bind(line.order_price)
            .bind(line.count)
            .bind(line_no as i64)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(order_id)
    }

    /// Cancels an order, restoring every line's stock, in one transaction.
    ///
    /// The aggregate itself decides whether cancellation is legal
    /// ([`Order::cancel`]); this method only applies the outcome. A second
    /// cancel of an already cancelled order is a no-op so stock is never
    /// credited twice.
    ///
    /// ## Errors
    /// - [`DbError::NotFound`] for an unknown order
    /// - `DeliveryCompleted` when the delivery already shipped; nothing
    ///   changes in that case
    pub async fn cancel_order(&self, order_id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let mut order = fetch_order(&mut tx, order_id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", order_id))?;

        if order.status == OrderStatus::Cancel {
            return Ok(());
        }

        let credits = order.cancel()?;

        debug!(order_id = %order_id, lines = credits.len(), "Cancelling order");

        sqlx::query("UPDATE orders SET status = 'CANCEL' WHERE id = ?1")
            .bind(order_id)
            .execute(&mut *tx)
            .await?;

        for credit in credits {
            credit_stock(&mut tx, &credit.item_id, credit.count).await?;
        }

        tx.commit().await?;

        Ok(())
    }

    // =========================================================================
    // Entity-Shaped Retrieval
    // =========================================================================

    /// Gets a full order aggregate by ID.
    pub async fn get_by_id(&self, order_id: &str) -> DbResult<Option<Order>> {
        let mut conn = self.pool.acquire().await?;
        fetch_order(&mut conn, order_id).await
    }

    /// Loads order aggregates matching the filter, the naive way: one
    /// filter query, then one delivery query and one lines query per order.
    pub async fn find_all(&self, search: &OrderSearch, page: Option<Page>) -> DbResult<Vec<Order>> {
        let mut qb = QueryBuilder::<Sqlite>::new(
            r#"
            SELECT o.id, o.member_id, o.order_date, o.status
            FROM orders o
            JOIN members m ON m.id = o.member_id
            "#,
        );
        push_filters(&mut qb, search);
        push_order_and_page(&mut qb, page);

        let heads: Vec<OrderRow> = qb.build_query_as().fetch_all(&self.pool).await?;

        let mut conn = self.pool.acquire().await?;
        let mut orders = Vec::with_capacity(heads.len());
        for head in heads {
            // One round trip per relation per order. That cost is the point
            // of this path; the batched shapes exist to avoid it.
            orders.push(hydrate_order(&mut conn, head).await?);
        }

        Ok(orders)
    }

    /// The derived member → orders back-reference, served by query.
    pub async fn find_by_member(&self, member_id: &str) -> DbResult<Vec<Order>> {
        let heads: Vec<OrderRow> = sqlx::query_as(
            r#"
            SELECT id, member_id, order_date, status
            FROM orders
            WHERE member_id = ?1
            ORDER BY order_date, id
            "#,
        )
        .bind(member_id)
        .fetch_all(&self.pool)
        .await?;

        let mut conn = self.pool.acquire().await?;
        let mut orders = Vec::with_capacity(heads.len());
        for head in heads {
            orders.push(hydrate_order(&mut conn, head).await?);
        }

        Ok(orders)
    }

    // =========================================================================
    // The Aggregate Loader
    // =========================================================================

    /// Loads order views matching `search`, shaped by the chosen strategy.
    ///
    /// All strategies produce semantically identical results for the same
    /// filter. When `page` is given with a shape that cannot support it,
    /// this fails with [`DbError::PaginationUnsupported`] before any Store
    /// round trip.
    pub async fn load_orders(
        &self,
        search: &OrderSearch,
        shape: FetchShape,
        page: Option<Page>,
    ) -> DbResult<Vec<OrderView>> {
        if page.is_some() && !shape.supports_pagination() {
            return Err(DbError::PaginationUnsupported { shape });
        }

        debug!(?shape, paged = page.is_some(), "Loading orders");

        let queries = OrderQueryRepository::new(self.pool.clone());
        match shape {
            FetchShape::NaiveGraph => self.load_naive(search, page).await,
            FetchShape::JoinFetchCollection => self.load_join_fetch(search).await,
            FetchShape::JoinFetchBatched => self.load_batched(search, page).await,
            FetchShape::Projection => queries.find_order_views(search, page).await,
            FetchShape::ProjectionBatched => queries.find_order_views_batched(search, page).await,
            FetchShape::FlatProjection => queries.find_order_views_flat(search).await,
        }
    }

    /// Naive graph walk: load aggregates, then touch every relation the
    /// view needs with its own query (member name per order, item name per
    /// line).
    async fn load_naive(&self, search: &OrderSearch, page: Option<Page>) -> DbResult<Vec<OrderView>> {
        let orders = self.find_all(search, page).await?;

        let mut conn = self.pool.acquire().await?;
        let mut views = Vec::with_capacity(orders.len());
        for order in orders {
            let member_name: String = sqlx::query_scalar("SELECT name FROM members WHERE id = ?1")
                .bind(&order.member_id)
                .fetch_one(&mut *conn)
                .await?;

            let mut order_items = Vec::with_capacity(order.order_items.len());
            for line in &order.order_items {
                let item_name: String = sqlx::query_scalar("SELECT name FROM items WHERE id = ?1")
                    .bind(&line.item_id)
                    .fetch_one(&mut *conn)
                    .await?;
                order_items.push(OrderItemView {
                    item_name,
                    order_price: line.order_price,
                    count: line.count,
                });
            }

            views.push(OrderView {
                order_id: order.id,
                member_name,
                order_date: order.order_date,
                status: order.status,
                address: order.delivery.address,
                order_items,
            });
        }

        Ok(views)
    }

    /// Fetch-join over the collection: one query, rows duplicated per
    /// line, parents de-duplicated in memory.
    async fn load_join_fetch(&self, search: &OrderSearch) -> DbResult<Vec<OrderView>> {
        let mut qb = QueryBuilder::<Sqlite>::new(
            r#"
            SELECT o.id, m.name AS member_name, o.order_date, o.status,
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

        let rows: Vec<JoinedRow> = qb.build_query_as().fetch_all(&self.pool).await?;

        // Parent fields repeat once per line; keep the first occurrence
        let mut views: Vec<OrderView> = Vec::new();
        for row in rows {
            let child = OrderItemView {
                item_name: row.item_name,
                order_price: row.order_price,
                count: row.count,
            };
            match views.last_mut() {
                Some(view) if view.order_id == row.id => view.order_items.push(child),
                _ => views.push(OrderView {
                    order_id: row.id,
                    member_name: row.member_name,
                    order_date: row.order_date,
                    status: row.status,
                    address: Address::new(row.city, row.street, row.zipcode),
                    order_items: vec![child],
                }),
            }
        }

        Ok(views)
    }

    /// To-one joins for distinct orders (pageable), then the line
    /// collections via `IN (id list)` queries bounded by the batch size.
    async fn load_batched(&self, search: &OrderSearch, page: Option<Page>) -> DbResult<Vec<OrderView>> {
        let heads = self.fetch_heads(search, page).await?;

        let mut views: Vec<OrderView> = heads
            .into_iter()
            .map(|head| OrderView {
                order_id: head.id,
                member_name: head.member_name,
                order_date: head.order_date,
                status: head.status,
                address: Address::new(head.city, head.street, head.zipcode),
                order_items: Vec::new(),
            })
            .collect();

        let ids: Vec<String> = views.iter().map(|v| v.order_id.clone()).collect();
        for chunk in ids.chunks(self.batch_size) {
            let children = fetch_children_in(&self.pool, chunk).await?;
            for child in children {
                if let Some(view) = views.iter_mut().find(|v| v.order_id == child.order_id) {
                    view.order_items.push(OrderItemView {
                        item_name: child.item_name,
                        order_price: child.order_price,
                        count: child.count,
                    });
                }
            }
        }

        Ok(views)
    }

    /// Distinct order heads with member and delivery joined in.
    async fn fetch_heads(&self, search: &OrderSearch, page: Option<Page>) -> DbResult<Vec<OrderHeadRow>> {
        let mut qb = QueryBuilder::<Sqlite>::new(
            r#"
            SELECT o.id, m.name AS member_name, o.order_date, o.status,
                   d.city, d.street, d.zipcode
            FROM orders o
            JOIN members m ON m.id = o.member_id
            JOIN deliveries d ON d.order_id = o.id
            "#,
        );
        push_filters(&mut qb, search);
        push_order_and_page(&mut qb, page);

        Ok(qb.build_query_as().fetch_all(&self.pool).await?)
    }
}

// =============================================================================
// Shared Query Helpers
// =============================================================================

/// Appends the WHERE clause for an [`OrderSearch`]. Every caller joins
/// members under the alias `m` and orders under `o`.
pub(crate) fn push_filters(qb: &mut QueryBuilder<'_, Sqlite>, search: &OrderSearch) {
    qb.push(" WHERE 1 = 1");
    if let Some(status) = search.status {
        qb.push(" AND o.status = ").push_bind(status);
    }
    if let Some(name) = &search.member_name {
        qb.push(" AND m.name LIKE ").push_bind(format!("%{name}%"));
    }
}

/// Deterministic parent ordering plus the optional pagination window.
fn push_order_and_page(qb: &mut QueryBuilder<'_, Sqlite>, page: Option<Page>) {
    qb.push(" ORDER BY o.order_date, o.id");
    if let Some(page) = page {
        qb.push(" LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset);
    }
}

/// Loads one batch of children for the given order ids, joined with items
/// for their names, in line order.
async fn fetch_children_in(pool: &SqlitePool, order_ids: &[String]) -> DbResult<Vec<ChildRow>> {
    if order_ids.is_empty() {
        return Ok(Vec::new());
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
        for id in order_ids {
            separated.push_bind(id);
        }
    }
    qb.push(") ORDER BY oi.order_id, oi.line_no");

    Ok(qb.build_query_as().fetch_all(pool).await?)
}

/// Hydrates a full aggregate from an already-fetched order row: one
/// delivery query plus one lines query.
async fn hydrate_order(conn: &mut SqliteConnection, head: OrderRow) -> DbResult<Order> {
    let delivery: DeliveryRow = sqlx::query_as(
        r#"
        SELECT id, city, street, zipcode, status
        FROM deliveries
        WHERE order_id = ?1
        "#,
    )
    .bind(&head.id)
    .fetch_one(&mut *conn)
    .await?;

    let lines: Vec<LineRow> = sqlx::query_as(
        r#"
        SELECT id, item_id, order_price, count
        FROM order_items
        WHERE order_id = ?1
        ORDER BY line_no
        "#,
    )
    .bind(&head.id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(Order {
        id: head.id,
        member_id: head.member_id,
        order_items: lines
            .into_iter()
            .map(|line| OrderItem {
                id: line.id,
                item_id: line.item_id,
                order_price: line.order_price,
                count: line.count,
            })
            .collect(),
        delivery: Delivery {
            id: delivery.id,
            address: Address::new(delivery.city, delivery.street, delivery.zipcode),
            status: delivery.status,
        },
        order_date: head.order_date,
        status: head.status,
    })
}

/// Fetches a full aggregate by id on the given connection (used inside the
/// cancel transaction).
pub(crate) async fn fetch_order(
    conn: &mut SqliteConnection,
    order_id: &str,
) -> DbResult<Option<Order>> {
    let head: Option<OrderRow> = sqlx::query_as(
        r#"
        SELECT id, member_id, order_date, status
        FROM orders
        WHERE id = ?1
        "#,
    )
    .bind(order_id)
    .fetch_optional(&mut *conn)
    .await?;

    match head {
        Some(head) => Ok(Some(hydrate_order(conn, head).await?)),
        None => Ok(None),
    }
}
