//! # Repository Module
//!
//! Database repository implementations for the order data layer.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  Service layer                                                         │
//! │       │                                                                 │
//! │       │  db.orders().load_orders(filter, shape, page)                  │
//! │       │  ↓                                                              │
//! │       ▼                                                                 │
//! │  OrderRepository                                                       │
//! │  ├── create_order / cancel_order       (transactional commands)        │
//! │  ├── find_all / find_by_member         (entity aggregates)             │
//! │  └── load_orders(filter, shape, page)  (the strategy family)           │
//! │       │                                                                 │
//! │       │  SQL queries                                                    │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Benefits:                                                              │
//! │  • Query cost is a visible part of the API, not a lazy-load            │
//! │    side effect of property access                                      │
//! │  • SQL is isolated in one place per aggregate                          │
//! │  • Easy to test against an in-memory database                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`member::MemberRepository`] - Member CRUD and name lookup
//! - [`item::ItemRepository`] - Item CRUD and guarded stock mutation
//! - [`order::OrderRepository`] - Order commands and retrieval strategies
//! - [`order_query::OrderQueryRepository`] - View-shaped projections

pub mod item;
pub mod member;
pub mod order;
pub mod order_query;
