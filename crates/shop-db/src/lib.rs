//! # shop-db: Database Layer for the Shop Order Data Layer
//!
//! This crate is the Store boundary of the order data layer: SQLite
//! storage behind sqlx, with repositories implementing the transactional
//! order commands and the six retrieval strategies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Order Data Layer Flow                              │
//! │                                                                         │
//! │  Service call (load_orders, create_order, cancel_order)                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                      shop-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │◄───│  member/item/ │    │  (embedded)  │  │   │
//! │  │   │  SqlitePool   │    │  order/query  │    │  001_init    │  │   │
//! │  │   └───────────────┘    └───────┬───────┘    └──────────────┘  │   │
//! │  │                                │                               │   │
//! │  │                     rows in ───┘─── views out via shop-core   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (or :memory: in tests)                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Store error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use shop_db::{Database, DbConfig, FetchShape, OrderSearch};
//!
//! let db = Database::new(DbConfig::new("path/to/shop.db")).await?;
//!
//! let order_id = db.orders().create_order(&member.id, &lines).await?;
//!
//! let views = db
//!     .orders()
//!     .load_orders(&OrderSearch::any(), FetchShape::JoinFetchBatched, None)
//!     .await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::item::ItemRepository;
pub use repository::member::MemberRepository;
pub use repository::order::{
    FetchShape, OrderLine, OrderRepository, OrderSearch, Page, DEFAULT_BATCH_SIZE,
};
pub use repository::order_query::OrderQueryRepository;
