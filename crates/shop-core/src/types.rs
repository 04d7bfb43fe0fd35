//! # Domain Types
//!
//! Core domain types for the order-management data layer.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Member      │   │      Item       │   │    Delivery     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  name           │   │  name, price    │   │  address        │       │
//! │  │  address        │   │  stock_quantity │   │  status         │       │
//! │  └─────────────────┘   │  kind (variant) │   └─────────────────┘       │
//! │                        └─────────────────┘                              │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐                              │
//! │  │   OrderStatus   │   │ DeliveryStatus  │                              │
//! │  │  Order / Cancel │   │  Ready / Comp   │                              │
//! │  └─────────────────┘   └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The Order aggregate itself lives in [`crate::order`]; this module holds
//! the leaf entities and value objects it is built from.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};

// =============================================================================
// Address
// =============================================================================

/// An address value object: immutable once constructed.
///
/// A delivery copies the owning member's address at order creation time, so
/// later member moves never rewrite delivery history.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Address {
    pub city: String,
    pub street: String,
    pub zipcode: String,
}

impl Address {
    pub fn new(
        city: impl Into<String>,
        street: impl Into<String>,
        zipcode: impl Into<String>,
    ) -> Self {
        Address {
            city: city.into(),
            street: street.into(),
            zipcode: zipcode.into(),
        }
    }
}

// =============================================================================
// Member
// =============================================================================

/// A member who places orders.
///
/// ## Back-References
/// The member → orders collection is a derived view obtained by query
/// (`OrderRepository::find_by_member`), never an in-memory back-pointer.
/// Ownership stays one-directional: Order → Member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    /// Unique identifier (UUID v4), assigned at creation.
    pub id: String,

    /// Display name; never empty.
    pub name: String,

    /// Embedded address value object.
    pub address: Address,
}

impl Member {
    /// Creates a member with a fresh surrogate key.
    pub fn new(name: impl Into<String>, address: Address) -> Self {
        Member {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            address,
        }
    }
}

// =============================================================================
// Item
// =============================================================================

/// Variant-specific item fields.
///
/// ## Design
/// A closed set of variants dispatched by tag. No variant overrides base
/// behavior, so a tagged union beats an inheritance hierarchy: the shared
/// capabilities (id, name, price, stock) live on [`Item`] itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ItemKind {
    Book { author: String, isbn: String },
    Movie { actor: String, director: String },
}

impl ItemKind {
    /// The discriminator stored in the items table.
    pub fn discriminator(&self) -> &'static str {
        match self {
            ItemKind::Book { .. } => "BOOK",
            ItemKind::Movie { .. } => "MOVIE",
        }
    }
}

/// A stocked catalog item.
///
/// ## Stock Invariant
/// `stock_quantity >= 0` always. The only mutators are [`Item::add_stock`]
/// and [`Item::remove_stock`]; retrieval strategies never touch stock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name.
    pub name: String,

    /// Current unit price. Order lines freeze their own copy.
    pub price: i64,

    /// Units on hand; never negative.
    pub stock_quantity: i64,

    /// Book/Movie variant fields.
    pub kind: ItemKind,
}

impl Item {
    /// Creates a book item.
    pub fn book(
        name: impl Into<String>,
        price: i64,
        stock_quantity: i64,
        author: impl Into<String>,
        isbn: impl Into<String>,
    ) -> Self {
        Item {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            price,
            stock_quantity,
            kind: ItemKind::Book {
                author: author.into(),
                isbn: isbn.into(),
            },
        }
    }

    /// Creates a movie item.
    pub fn movie(
        name: impl Into<String>,
        price: i64,
        stock_quantity: i64,
        actor: impl Into<String>,
        director: impl Into<String>,
    ) -> Self {
        Item {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            price,
            stock_quantity,
            kind: ItemKind::Movie {
                actor: actor.into(),
                director: director.into(),
            },
        }
    }

    /// Credits stock back.
    ///
    /// Used for manual restock and for cancellation reversal. No upper
    /// bound is enforced. The quantity is assumed positive by the caller.
    pub fn add_stock(&mut self, quantity: i64) {
        self.stock_quantity += quantity;
    }

    /// Debits stock, atomically check-then-set.
    ///
    /// ## Errors
    /// [`CoreError::InsufficientStock`] when the resulting quantity would go
    /// negative; the item is left **unchanged** in that case.
    pub fn remove_stock(&mut self, quantity: i64) -> CoreResult<()> {
        let rest = self.stock_quantity - quantity;
        if rest < 0 {
            return Err(CoreError::InsufficientStock {
                item: self.name.clone(),
                available: self.stock_quantity,
                requested: quantity,
            });
        }

        self.stock_quantity = rest;
        Ok(())
    }
}

// =============================================================================
// Delivery
// =============================================================================

/// The status of a delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "UPPERCASE")]
pub enum DeliveryStatus {
    /// Awaiting shipment. Orders in this state may still be cancelled.
    Ready,
    /// Delivery completed. Cancellation is rejected from here on.
    Comp,
}

impl Default for DeliveryStatus {
    fn default() -> Self {
        DeliveryStatus::Ready
    }
}

/// A delivery owned 1:1 by its order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Delivery {
    pub id: String,
    /// Frozen copy of the member's address at order creation.
    pub address: Address,
    pub status: DeliveryStatus,
}

impl Delivery {
    /// Creates a delivery bound for the given member's current address.
    pub fn for_member(member: &Member) -> Self {
        Delivery {
            id: Uuid::new_v4().to_string(),
            address: member.address.clone(),
            status: DeliveryStatus::Ready,
        }
    }
}

// =============================================================================
// Order Status
// =============================================================================

/// The lifecycle status of an order.
///
/// The only legal transition is Order → Cancel, never the reverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    Order,
    Cancel,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn book(stock: i64) -> Item {
        Item::book("JPA BOOK", 10_000, stock, "kim", "11111")
    }

    #[test]
    fn test_remove_then_add_stock_round_trips() {
        let mut item = book(100);
        item.remove_stock(30).unwrap();
        assert_eq!(item.stock_quantity, 70);
        item.add_stock(30);
        assert_eq!(item.stock_quantity, 100);
    }

    #[test]
    fn test_remove_stock_over_available_fails_without_mutation() {
        let mut item = book(3);
        let err = item.remove_stock(5).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientStock {
                available: 3,
                requested: 5,
                ..
            }
        ));
        // No partial mutation on failure
        assert_eq!(item.stock_quantity, 3);
    }

    #[test]
    fn test_remove_stock_to_exactly_zero_is_allowed() {
        let mut item = book(5);
        item.remove_stock(5).unwrap();
        assert_eq!(item.stock_quantity, 0);
    }

    #[test]
    fn test_delivery_copies_member_address() {
        let member = Member::new("userA", Address::new("Seoul", "1", "111"));
        let delivery = Delivery::for_member(&member);
        assert_eq!(delivery.address, member.address);
        assert_eq!(delivery.status, DeliveryStatus::Ready);
    }

    #[test]
    fn test_item_kind_discriminator() {
        let book = book(1);
        assert_eq!(book.kind.discriminator(), "BOOK");
        let movie = Item::movie("Oldboy", 12_000, 10, "choi", "park");
        assert_eq!(movie.kind.discriminator(), "MOVIE");
    }
}
