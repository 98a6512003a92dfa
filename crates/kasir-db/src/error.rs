//! # Database Error Types
//!
//! Error types for database operations and for the order commit.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)          Checkout rule (CoreError)         │
//! │       │                                      │                          │
//! │       ▼                                      │                          │
//! │  DbError ← Adds context and categorization   │                          │
//! │       │                                      │                          │
//! │       ▼                                      ▼                          │
//! │  OrderError ── Persistence / Conflict ── Rejected                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ApiError (in server) ← Serialized for the client                      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use kasir_core::CoreError;
use thiserror::Error;

/// Database operation errors.
///
/// These errors wrap sqlx errors and provide additional context
/// for debugging and user feedback.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Inserting a duplicate product code
    /// - Duplicate operator email
    /// - Order number collision
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    ///
    /// ## When This Occurs
    /// - Referencing a non-existent company_id
    /// - Deleting a company that still has orders
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// CHECK constraint violation (negative stock or price).
    #[error("Check constraint violation: {message}")]
    CheckViolation { message: String },

    /// The database stayed locked past the busy timeout.
    #[error("Database is busy: {0}")]
    Busy(String),

    /// Database connection failed.
    ///
    /// ## When This Occurs
    /// - Database file doesn't exist and can't be created
    /// - File permissions issue
    /// - Disk full
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Transaction failed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
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

    /// Creates a UniqueViolation error.
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    /// True when retrying later could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, DbError::Busy(_) | DbError::PoolExhausted)
    }
}

/// SQLite primary result codes for SQLITE_BUSY and SQLITE_LOCKED,
/// plus their extended variants.
const BUSY_CODES: &[&str] = &["5", "6", "261", "262", "517"];

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → Analyze code/message for constraint type
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
                let code = db_err.code();

                // UNIQUE constraint: "UNIQUE constraint failed: <table>.<column>"
                // FK constraint: "FOREIGN KEY constraint failed"
                // CHECK constraint: "CHECK constraint failed: <expr>"
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
                } else if msg.contains("CHECK constraint failed") {
                    DbError::CheckViolation {
                        message: msg.to_string(),
                    }
                } else if msg.contains("database is locked")
                    || msg.contains("database table is locked")
                    || code.as_deref().is_some_and(|c| BUSY_CODES.contains(&c))
                {
                    DbError::Busy(msg.to_string())
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

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

// =============================================================================
// Order Commit Errors
// =============================================================================

/// Coarse classification of a failed commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderErrorKind {
    /// The request broke a business rule; resubmitting unchanged will fail again.
    Validation,
    /// Lost a race with another commit; the client may re-quote and retry.
    Conflict,
    /// The store failed; nothing was written.
    Persistence,
}

/// Why an order was not committed. In every case the transaction was rolled
/// back: no order row, no lines, no stock change, no sequence consumed.
#[derive(Debug, Error)]
pub enum OrderError {
    /// A checkout rule rejected the request.
    #[error(transparent)]
    Rejected(#[from] CoreError),

    /// Concurrent activity prevented the commit.
    #[error("Order conflict: {0}")]
    Conflict(String),

    /// The database failed.
    #[error(transparent)]
    Persistence(DbError),
}

impl OrderError {
    pub fn kind(&self) -> OrderErrorKind {
        match self {
            OrderError::Rejected(_) => OrderErrorKind::Validation,
            OrderError::Conflict(_) => OrderErrorKind::Conflict,
            OrderError::Persistence(_) => OrderErrorKind::Persistence,
        }
    }
}

/// Sorts store failures into conflicts and genuine persistence errors.
///
/// ```text
/// Busy / PoolExhausted              → Conflict
/// UNIQUE on orders.order_number     → Conflict
/// anything else                     → Persistence
/// ```
impl From<DbError> for OrderError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Busy(msg) => OrderError::Conflict(format!("database busy: {}", msg)),
            DbError::PoolExhausted => {
                OrderError::Conflict("no database connection available".to_string())
            }
            DbError::UniqueViolation { ref field, .. } if field.contains("order_number") => {
                OrderError::Conflict("order number already allocated".to_string())
            }
            other => OrderError::Persistence(other),
        }
    }
}

impl From<sqlx::Error> for OrderError {
    fn from(err: sqlx::Error) -> Self {
        OrderError::from(DbError::from(err))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_error_kinds() {
        let rejected = OrderError::from(CoreError::EmptyCart);
        assert_eq!(rejected.kind(), OrderErrorKind::Validation);

        let busy = OrderError::from(DbError::Busy("database is locked".to_string()));
        assert_eq!(busy.kind(), OrderErrorKind::Conflict);

        let collision = OrderError::from(DbError::duplicate("orders.order_number", "ORD-1"));
        assert_eq!(collision.kind(), OrderErrorKind::Conflict);

        let other_unique = OrderError::from(DbError::duplicate("products.code", "X"));
        assert_eq!(other_unique.kind(), OrderErrorKind::Persistence);

        let failed = OrderError::from(DbError::QueryFailed("disk I/O error".to_string()));
        assert_eq!(failed.kind(), OrderErrorKind::Persistence);
    }

    #[test]
    fn test_rejected_is_transparent() {
        let err = OrderError::from(CoreError::ProductInactive("ELK-001".to_string()));
        assert_eq!(err.to_string(), "Product ELK-001 is inactive");
    }

    #[test]
    fn test_transient() {
        assert!(DbError::Busy(String::new()).is_transient());
        assert!(DbError::PoolExhausted.is_transient());
        assert!(!DbError::not_found("Order", "x").is_transient());
    }
}
