//! # shop-core: Pure Business Logic for the Shop Order Data Layer
//!
//! This crate is the **heart** of the order data layer. It contains the
//! entity/invariant model as pure logic with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Order Data Layer Architecture                       │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     Calling Service Layer                       │   │
//! │  │     create_order, cancel_order, load_orders(filter, shape)      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                ★ shop-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   order   │  │   view    │  │ validation│  │   │
//! │  │   │  Member   │  │   Order   │  │ OrderView │  │   rules   │  │   │
//! │  │   │  Item     │  │ OrderItem │  │ flattener │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    shop-db (Store boundary)                     │   │
//! │  │          SQLite queries, migrations, retrieval strategies       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Leaf entities and value objects (Member, Item, Delivery)
//! - [`order`] - The Order aggregate: lifecycle, totals, stock debit/credit
//! - [`view`] - View DTOs and the flat-row regrouping algorithm
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation rules
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: deterministic, no side effects outside `&mut self`
//! 2. **No I/O**: database, network, file system access is FORBIDDEN here
//! 3. **Explicit Errors**: business rules fail as typed results, never panics
//! 4. **Explicit Commands**: mutation happens only through named methods
//!    (`cancel`, `add_stock`, `remove_stock`), never implicitly on access
//!
//! ## Example Usage
//!
//! ```rust
//! use shop_core::{Address, Delivery, Item, Member, Order, OrderItem};
//!
//! let member = Member::new("userA", Address::new("Seoul", "1", "111"));
//! let mut book = Item::book("JPA BOOK", 10_000, 100, "kim", "11111");
//!
//! // Construction and stock debit are one step
//! let line = OrderItem::create(&mut book, 10_000, 1).unwrap();
//! assert_eq!(book.stock_quantity, 99);
//!
//! let delivery = Delivery::for_member(&member);
//! let order = Order::create(&member, delivery, vec![line]).unwrap();
//! assert_eq!(order.total_price(), 10_000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod order;
pub mod types;
pub mod validation;
pub mod view;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use shop_core::Order` instead of
// `use shop_core::order::Order`

pub use error::{CoreError, CoreResult, ValidationError};
pub use order::{Order, OrderItem, StockCredit};
pub use types::{Address, Delivery, DeliveryStatus, Item, ItemKind, Member, OrderStatus};
pub use view::{group_flat_rows, OrderFlatRow, OrderItemView, OrderView};
