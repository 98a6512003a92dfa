//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Handler: Result<Json<T>, ApiError>                                     │
//! │                                                                         │
//! │  ValidationError ──┐                                                    │
//! │  CoreError ────────┼──► ApiError { code, message } ──► (status, JSON)   │
//! │  DbError ──────────┤                                                    │
//! │  OrderError ───────┘                                                    │
//! │                                                                         │
//! │  400 VALIDATION_ERROR     malformed input                               │
//! │  404 NOT_FOUND            unknown company/product/operator/order        │
//! │  409 CONFLICT             duplicates, references, lost commit races     │
//! │  422 INSUFFICIENT_STOCK / PAYMENT_ERROR / TOTALS_MISMATCH /             │
//! │      BUSINESS_RULE        checkout rules                                │
//! │  500 DATABASE_ERROR / INTERNAL                                          │
//! │  503 UNAVAILABLE          database busy or pool exhausted               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Store failures are logged with their detail; the response only carries a
//! generic message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use kasir_core::{CoreError, ValidationError};
use kasir_db::{DbError, OrderError};

/// Error body returned by every failing endpoint.
///
/// ```json
/// { "code": "NOT_FOUND", "message": "Product not found: 8c1e..." }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Input validation failed (400)
    ValidationError,

    /// Resource not found (404)
    NotFound,

    /// Duplicate, referenced record, or concurrent update (409)
    Conflict,

    /// Not enough stock for a line (422)
    InsufficientStock,

    /// Paid amount below the total (422)
    PaymentError,

    /// Client-displayed totals differ from the server's (422)
    TotalsMismatch,

    /// Other checkout rule (422)
    BusinessRule,

    /// Database operation failed (500)
    DatabaseError,

    /// Database temporarily unavailable (503)
    Unavailable,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::InsufficientStock
            | ErrorCode::PaymentError
            | ErrorCode::TotalsMismatch
            | ErrorCode::BusinessRule => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::DatabaseError | ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn status(&self) -> StatusCode {
        self.code.status()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::Conflict,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::ForeignKeyViolation { message } => {
                tracing::debug!("Foreign key violation: {}", message);
                ApiError::new(
                    ErrorCode::Conflict,
                    "Record is referenced by other records or references a missing one",
                )
            }
            DbError::CheckViolation { message } => {
                tracing::debug!("Check constraint violation: {}", message);
                ApiError::new(ErrorCode::BusinessRule, "Value violates a stored constraint")
            }
            DbError::Busy(e) => {
                tracing::warn!("Database busy: {}", e);
                ApiError::new(ErrorCode::Unavailable, "Database is busy, try again")
            }
            DbError::PoolExhausted => {
                tracing::warn!("Database pool exhausted");
                ApiError::new(ErrorCode::Unavailable, "Database pool exhausted")
            }
            DbError::ConnectionFailed(e) => {
                tracing::error!("Database connection failed: {}", e);
                ApiError::new(ErrorCode::Unavailable, "Database connection failed")
            }
            DbError::MigrationFailed(e) => {
                tracing::error!("Database migration failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database transaction failed")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts checkout and domain errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let code = match &err {
            e if e.is_not_found() => ErrorCode::NotFound,
            CoreError::EmptyCart
            | CoreError::CartTooLarge { .. }
            | CoreError::InvalidQuantity { .. }
            | CoreError::Validation(_) => ErrorCode::ValidationError,
            CoreError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            CoreError::Underpayment { .. } => ErrorCode::PaymentError,
            CoreError::TotalsMismatch { .. } => ErrorCode::TotalsMismatch,
            _ => ErrorCode::BusinessRule,
        };
        ApiError::new(code, err.to_string())
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

/// Converts commit outcomes to API errors.
impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::Rejected(e) => e.into(),
            OrderError::Conflict(msg) => ApiError::new(ErrorCode::Conflict, msg),
            OrderError::Persistence(e) => {
                let api: ApiError = e.into();
                match api.code {
                    ErrorCode::DatabaseError | ErrorCode::Unavailable | ErrorCode::Internal => api,
                    _ => ApiError::new(ErrorCode::DatabaseError, "Order could not be saved"),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_error_mapping() {
        let err: ApiError = CoreError::ProductNotFound("p-1".into()).into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let err: ApiError = CoreError::EmptyCart.into();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err: ApiError = CoreError::InsufficientStock {
            code: "ELK-001".into(),
            available: 1,
            requested: 2,
        }
        .into();
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.code, ErrorCode::InsufficientStock);

        let err: ApiError = CoreError::Underpayment {
            paid_cents: 1,
            total_cents: 2,
        }
        .into();
        assert_eq!(err.code, ErrorCode::PaymentError);
    }

    #[test]
    fn test_db_error_mapping() {
        let err: ApiError = DbError::duplicate("code", "ELK-001").into();
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert!(err.message.contains("ELK-001"));

        let err: ApiError = DbError::QueryFailed("no such column: secret".into()).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.message.contains("secret"));

        let err: ApiError = DbError::Busy("database is locked".into()).into();
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_order_error_mapping() {
        let err: ApiError = OrderError::Conflict("stock changed".into()).into();
        assert_eq!(err.status(), StatusCode::CONFLICT);

        let err: ApiError = OrderError::Persistence(DbError::not_found("Order", "x")).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let err: ApiError = OrderError::Rejected(CoreError::TotalsMismatch {
            field: "total",
            expected: 1,
            computed: 2,
        })
        .into();
        assert_eq!(err.code, ErrorCode::TotalsMismatch);
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(ApiError::not_found("Order", "ORD-1")).unwrap();
        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["message"], "Order not found: ORD-1");
    }
}
