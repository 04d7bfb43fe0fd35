//! # Database Error Types
//!
//! Error types for Store operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (this module) ← Categorizes: not-found, constraint,           │
//! │       │                  conflict, timeout, connectivity               │
//! │       ▼                                                                 │
//! │  Caller / service layer ← Decides on retries, user messages           │
//! │                                                                         │
//! │  Business-rule failures (shop_core::CoreError) travel through the      │
//! │  Domain variant and abort the enclosing transaction: the rolled-back   │
//! │  unit of work leaves no partial writes to patch up.                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Infrastructure errors are propagated unchanged; this crate never
//! retries automatically. Retry policy belongs to the caller.

use thiserror::Error;

use crate::repository::order::FetchShape;

/// Store operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in the database.
    ///
    /// ## When This Occurs
    /// - A referenced member, item, or order id doesn't exist
    /// - `fetch_one` returns no rows
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A business rule rejected the operation.
    ///
    /// The transaction is rolled back before this is returned; the caller
    /// may recover (e.g., reject the order) without cleanup.
    #[error(transparent)]
    Domain(#[from] shop_core::CoreError),

    /// Pagination was requested with a strategy that cannot support it.
    ///
    /// Raised **before** any query is issued: row-level duplication in the
    /// fetch-join-collection and flat-row strategies would make offset and
    /// limit silently wrong, so they fail fast instead.
    #[error("fetch shape {shape:?} does not support pagination")]
    PaginationUnsupported { shape: FetchShape },

    /// Unique constraint violation.
    #[error("duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    ///
    /// ## When This Occurs
    /// - Referencing a non-existent member_id / item_id / order_id
    #[error("foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Concurrent writers collided (SQLite busy / locked).
    ///
    /// Stock mutation is serialized per item at this layer; a conflict
    /// means the competing transaction should be retried by the caller.
    #[error("write conflict: {0}")]
    Conflict(String),

    /// The Store did not answer within the caller-supplied timeout.
    ///
    /// The aborted unit of work leaves no partial mutation visible.
    #[error("store timed out: {0}")]
    Timeout(String),

    /// Database connection failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → Analyze message for constraint/busy kind
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // SQLite constraint messages:
                // UNIQUE constraint: "UNIQUE constraint failed: <table>.<column>"
                // FK constraint: "FOREIGN KEY constraint failed"
                // Busy writer: "database is locked"
                if msg.contains("UNIQUE constraint failed") {
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation {
                        field,
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else if msg.contains("database is locked") || msg.contains("database is busy") {
                    DbError::Conflict(msg.to_string())
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;
