//! # Order Views and the Row Flattener
//!
//! View DTOs shaped for callers of `load_orders`, plus the pure regrouping
//! algorithm behind the flat-row projection strategy.
//!
//! ## Why Regrouping Exists
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              Flat-Row Projection (one wide join)                        │
//! │                                                                         │
//! │  SELECT o.*, m.name, d.*, oi.*, i.name                                 │
//! │    FROM orders o JOIN ... JOIN order_items oi JOIN items i             │
//! │                                                                         │
//! │  order 1 │ userA │ JPA BOOK   │ 10000 │ 1   ┐                          │
//! │  order 1 │ userA │ JPA BOOK2  │ 20000 │ 2   ├─ parent fields           │
//! │  order 2 │ userB │ SPRING ... │ 20000 │ 3   ┘  repeat per child        │
//! │       │                                                                 │
//! │       ▼  group_flat_rows (in memory, pure)                             │
//! │                                                                         │
//! │  OrderView { order 1, userA, items: [JPA BOOK ×1, JPA BOOK2 ×2] }      │
//! │  OrderView { order 2, userB, items: [SPRING ... ×3] }                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The grouping is the in-memory half of that strategy: minimum query
//! count, maximum duplication, reconstruction here.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Address, OrderStatus};

// =============================================================================
// View DTOs
// =============================================================================

/// A child-level view: one order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItemView {
    pub item_name: String,
    pub order_price: i64,
    pub count: i64,
}

impl OrderItemView {
    /// Line total: frozen price × count.
    pub fn total_price(&self) -> i64 {
        self.order_price * self.count
    }
}

/// The parent-level view: one order with its grouped lines.
///
/// All six retrieval strategies produce this shape; they differ only in
/// query count, payload duplication, and pagination support.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderView {
    pub order_id: String,
    pub member_name: String,
    pub order_date: DateTime<Utc>,
    pub status: OrderStatus,
    pub address: Address,
    pub order_items: Vec<OrderItemView>,
}

// =============================================================================
// Flat Row
// =============================================================================

/// One row of the wide join: full parent fields repeated once per child.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct OrderFlatRow {
    pub order_id: String,
    pub member_name: String,
    pub order_date: DateTime<Utc>,
    pub status: OrderStatus,
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub address: Address,
    pub item_name: String,
    pub order_price: i64,
    pub count: i64,
}

// =============================================================================
// Row Flattener
// =============================================================================

/// Regroups duplicated flat rows into one parent view per distinct order.
///
/// ## Algorithm
/// Group rows by `order_id`. Parent field values are taken from the first
/// row of each group: they are assumed identical across all rows sharing
/// that id (an invariant of the source join, not re-verified here).
/// Children keep the row order within each group; parents keep their
/// first-appearance order.
///
/// Pure function: same input rows (including order) always produce the
/// same grouped output. No storage access.
pub fn group_flat_rows(rows: Vec<OrderFlatRow>) -> Vec<OrderView> {
    let mut views: Vec<OrderView> = Vec::new();
    let mut index_by_order: HashMap<String, usize> = HashMap::new();

    for row in rows {
        let child = OrderItemView {
            item_name: row.item_name,
            order_price: row.order_price,
            count: row.count,
        };

        match index_by_order.get(&row.order_id) {
            Some(&idx) => views[idx].order_items.push(child),
            None => {
                index_by_order.insert(row.order_id.clone(), views.len());
                views.push(OrderView {
                    order_id: row.order_id,
                    member_name: row.member_name,
                    order_date: row.order_date,
                    status: row.status,
                    address: row.address,
                    order_items: vec![child],
                });
            }
        }
    }

    views
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn row(order_id: &str, member: &str, item: &str, price: i64, count: i64) -> OrderFlatRow {
        OrderFlatRow {
            order_id: order_id.to_string(),
            member_name: member.to_string(),
            order_date: "2026-08-29T00:00:00Z".parse().unwrap(),
            status: OrderStatus::Order,
            address: Address::new("Seoul", "1", "111"),
            item_name: item.to_string(),
            order_price: price,
            count,
        }
    }

    #[test]
    fn test_two_orders_three_rows_group_into_two_parents() {
        let rows = vec![
            row("o1", "userA", "JPA BOOK", 10_000, 1),
            row("o1", "userA", "JPA BOOK2", 20_000, 2),
            row("o2", "userB", "SPRING BOOK", 20_000, 3),
        ];

        let views = group_flat_rows(rows);

        assert_eq!(views.len(), 2);
        assert_eq!(views[0].order_id, "o1");
        assert_eq!(views[0].order_items.len(), 2);
        assert_eq!(views[0].order_items[0].item_name, "JPA BOOK");
        assert_eq!(views[0].order_items[1].item_name, "JPA BOOK2");
        assert_eq!(views[1].order_id, "o2");
        assert_eq!(views[1].order_items.len(), 1);
    }

    #[test]
    fn test_child_order_within_group_follows_row_order() {
        let rows = vec![
            row("o1", "userA", "b", 1, 1),
            row("o1", "userA", "a", 1, 1),
            row("o1", "userA", "c", 1, 1),
        ];

        let views = group_flat_rows(rows);
        let names: Vec<&str> = views[0]
            .order_items
            .iter()
            .map(|i| i.item_name.as_str())
            .collect();
        assert_eq!(names, ["b", "a", "c"]);
    }

    #[test]
    fn test_parents_keep_first_appearance_order_even_interleaved() {
        let rows = vec![
            row("o2", "userB", "x", 1, 1),
            row("o1", "userA", "y", 1, 1),
            row("o2", "userB", "z", 1, 1),
        ];

        let views = group_flat_rows(rows);
        assert_eq!(views[0].order_id, "o2");
        assert_eq!(views[0].order_items.len(), 2);
        assert_eq!(views[1].order_id, "o1");
    }

    #[test]
    fn test_grouping_is_deterministic() {
        let rows = vec![
            row("o1", "userA", "JPA BOOK", 10_000, 1),
            row("o2", "userB", "SPRING BOOK", 20_000, 3),
            row("o1", "userA", "JPA BOOK2", 20_000, 2),
        ];

        let first = group_flat_rows(rows.clone());
        let second = group_flat_rows(rows);
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_input_yields_no_views() {
        assert!(group_flat_rows(Vec::new()).is_empty());
    }

    #[test]
    fn test_line_total() {
        let line = OrderItemView {
            item_name: "JPA BOOK2".to_string(),
            order_price: 20_000,
            count: 2,
        };
        assert_eq!(line.total_price(), 40_000);
    }
}
