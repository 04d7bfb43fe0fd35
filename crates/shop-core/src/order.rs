//! # The Order Aggregate
//!
//! An [`Order`] together with its owned [`OrderItem`]s and
//! [`Delivery`](crate::types::Delivery) forms one consistency boundary:
//! they are created together, persisted together, and cancelled together.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Order Lifecycle                                   │
//! │                                                                         │
//! │  1. CREATE (one unit)                                                  │
//! │     OrderItem::create(item, price, count)  ← debits stock per line    │
//! │     Order::create(member, delivery, lines) ← status ORDER, date now   │
//! │                                                                         │
//! │  2. (ONLY POST-CREATION MUTATION) CANCEL                               │
//! │     Order::cancel()                                                    │
//! │     ├── delivery COMP?  → DeliveryCompleted, nothing changes           │
//! │     └── otherwise       → status CANCEL + one stock credit per line   │
//! │                                                                         │
//! │  Anytime: total_price() = Σ order_price × count  (pure, any status)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stock restoration on cancel is expressed as returned [`StockCredit`]s so
//! the Store can apply them inside the same transaction that flips the
//! status; in-memory callers apply them through [`OrderItem::cancel`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::types::{Delivery, DeliveryStatus, Item, Member, OrderStatus};
use crate::validation::{validate_count, validate_price};

// =============================================================================
// Order Item
// =============================================================================

/// A line item: one item reference with a frozen price and a count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// The ordered catalog item.
    pub item_id: String,

    /// Price at time of order, independent of later item price changes.
    pub order_price: i64,

    /// Units ordered; always positive.
    pub count: i64,
}

impl OrderItem {
    /// Creates a line item and immediately debits the item's stock.
    ///
    /// Construction and stock debit are atomic from the caller's view: on
    /// [`CoreError::InsufficientStock`] no `OrderItem` exists and the item
    /// is unchanged.
    pub fn create(item: &mut Item, order_price: i64, count: i64) -> CoreResult<OrderItem> {
        validate_price(order_price)?;
        validate_count(count)?;
        item.remove_stock(count)?;

        Ok(OrderItem {
            id: Uuid::new_v4().to_string(),
            item_id: item.id.clone(),
            order_price,
            count,
        })
    }

    /// Restores this line's stock on cancellation.
    pub fn cancel(&self, item: &mut Item) {
        item.add_stock(self.count);
    }

    /// Line total: frozen price × count.
    pub fn total_price(&self) -> i64 {
        self.order_price * self.count
    }
}

// =============================================================================
// Stock Credit
// =============================================================================

/// A pending stock restoration produced by [`Order::cancel`].
///
/// The Store applies these in the same transaction that flips the order
/// status, keeping cancellation all-or-nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockCredit {
    pub item_id: String,
    pub count: i64,
}

// =============================================================================
// Order
// =============================================================================

/// The aggregate root: one member's order with its lines and delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// The ordering member. Authoritative ownership is Order → Member.
    pub member_id: String,

    /// Line items in insertion order.
    pub order_items: Vec<OrderItem>,

    /// Owned 1:1 delivery, cascades with the order.
    pub delivery: Delivery,

    /// Set at creation, immutable afterwards.
    pub order_date: DateTime<Utc>,

    /// Lifecycle status; transitions only Order → Cancel.
    pub status: OrderStatus,
}

impl Order {
    /// Builds an order in status `Order` with `order_date = now`.
    ///
    /// The lines must already have debited their stock (see
    /// [`OrderItem::create`]). If any debit failed, the whole construction
    /// is failed and nothing may be persisted.
    ///
    /// ## Errors
    /// [`CoreError::EmptyOrder`] when no line items are supplied.
    pub fn create(
        member: &Member,
        delivery: Delivery,
        order_items: Vec<OrderItem>,
    ) -> CoreResult<Order> {
        if order_items.is_empty() {
            return Err(CoreError::EmptyOrder);
        }

        Ok(Order {
            id: Uuid::new_v4().to_string(),
            member_id: member.id.clone(),
            order_items,
            delivery,
            order_date: Utc::now(),
            status: OrderStatus::Order,
        })
    }

    /// Cancels the order.
    ///
    /// ## Errors
    /// [`CoreError::DeliveryCompleted`] when the delivery already shipped;
    /// the order is left unchanged in that case.
    ///
    /// ## Returns
    /// One [`StockCredit`] per line item, to be applied by the caller in
    /// the same unit of work. Partial cancellation is not a valid end
    /// state: apply all credits or none.
    pub fn cancel(&mut self) -> CoreResult<Vec<StockCredit>> {
        if self.delivery.status == DeliveryStatus::Comp {
            return Err(CoreError::DeliveryCompleted {
                order_id: self.id.clone(),
            });
        }

        self.status = OrderStatus::Cancel;

        Ok(self
            .order_items
            .iter()
            .map(|line| StockCredit {
                item_id: line.item_id.clone(),
                count: line.count,
            })
            .collect())
    }

    /// Sum of line totals. Pure; valid in any status — a cancelled order
    /// retains its historical total.
    pub fn total_price(&self) -> i64 {
        self.order_items.iter().map(OrderItem::total_price).sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Address;

    fn member() -> Member {
        Member::new("userA", Address::new("Seoul", "1", "111"))
    }

    fn fixture() -> (Member, Item, Item) {
        let book1 = Item::book("JPA BOOK", 10_000, 100, "kim", "11111");
        let book2 = Item::book("JPA BOOK2", 20_000, 100, "kim", "22222");
        (member(), book1, book2)
    }

    #[test]
    fn test_create_order_debits_stock_and_totals() {
        let (member, mut book1, mut book2) = fixture();

        let line1 = OrderItem::create(&mut book1, 10_000, 1).unwrap();
        let line2 = OrderItem::create(&mut book2, 20_000, 2).unwrap();
        let delivery = Delivery::for_member(&member);
        let order = Order::create(&member, delivery, vec![line1, line2]).unwrap();

        assert_eq!(order.status, OrderStatus::Order);
        assert_eq!(order.total_price(), 50_000);
        assert_eq!(book1.stock_quantity, 99);
        assert_eq!(book2.stock_quantity, 98);
    }

    #[test]
    fn test_order_item_factory_propagates_insufficient_stock() {
        let mut book = Item::book("JPA BOOK", 10_000, 2, "kim", "11111");
        let err = OrderItem::create(&mut book, 10_000, 3).unwrap_err();
        assert!(matches!(err, CoreError::InsufficientStock { .. }));
        assert_eq!(book.stock_quantity, 2);
    }

    #[test]
    fn test_order_requires_at_least_one_line() {
        let member = member();
        let delivery = Delivery::for_member(&member);
        let err = Order::create(&member, delivery, vec![]).unwrap_err();
        assert!(matches!(err, CoreError::EmptyOrder));
    }

    #[test]
    fn test_cancel_restores_stock_and_sets_status() {
        let (member, mut book1, mut book2) = fixture();

        let line1 = OrderItem::create(&mut book1, 10_000, 1).unwrap();
        let line2 = OrderItem::create(&mut book2, 20_000, 2).unwrap();
        let delivery = Delivery::for_member(&member);
        let mut order = Order::create(&member, delivery, vec![line1, line2]).unwrap();

        let credits = order.cancel().unwrap();
        assert_eq!(order.status, OrderStatus::Cancel);
        assert_eq!(credits.len(), 2);

        for (credit, item) in credits.iter().zip([&mut book1, &mut book2]) {
            assert_eq!(credit.item_id, item.id);
            item.add_stock(credit.count);
        }
        assert_eq!(book1.stock_quantity, 100);
        assert_eq!(book2.stock_quantity, 100);

        // Cancelled orders retain their historical total
        assert_eq!(order.total_price(), 50_000);
    }

    #[test]
    fn test_cancel_rejected_after_delivery_completed() {
        let (member, mut book1, _) = fixture();

        let line = OrderItem::create(&mut book1, 10_000, 1).unwrap();
        let delivery = Delivery::for_member(&member);
        let mut order = Order::create(&member, delivery, vec![line]).unwrap();
        order.delivery.status = DeliveryStatus::Comp;

        let err = order.cancel().unwrap_err();
        assert!(matches!(err, CoreError::DeliveryCompleted { .. }));
        assert_eq!(order.status, OrderStatus::Order);
        assert_eq!(book1.stock_quantity, 99);
    }
}
