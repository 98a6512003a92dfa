//! # Error Types
//!
//! Domain-specific error types for kasir-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  kasir-core errors (this file)                                         │
//! │  ├── CoreError        - Checkout rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  kasir-db errors (separate crate)                                      │
//! │  ├── DbError          - Database operation failures                    │
//! │  └── OrderError       - Commit outcome: Rejected / Conflict / ...      │
//! │                                                                         │
//! │  HTTP API errors (in app)                                              │
//! │  └── ApiError         - What the cashier screen sees (serialized)      │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → OrderError → ApiError → Client    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (code, ID, amounts)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations raised while planning a checkout.
///
/// Every variant means the request was refused before anything was written.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoreError {
    /// The cart has no lines.
    #[error("Order must contain at least one item")]
    EmptyCart,

    /// Cart has exceeded maximum allowed distinct lines.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Item quantity is outside `1..=max`.
    #[error("Quantity {requested} for product {product_id} must be between 1 and {max}")]
    InvalidQuantity {
        product_id: String,
        requested: i64,
        max: i64,
    },

    /// The company does not exist.
    #[error("Company not found: {0}")]
    CompanyNotFound(String),

    /// The company exists but is not trading.
    #[error("Company {0} is inactive")]
    CompanyInactive(String),

    /// The operator does not exist.
    #[error("Operator not found: {0}")]
    OperatorNotFound(String),

    /// Product cannot be found.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Product exists but is sold by a different company.
    #[error("Product {code} does not belong to company {company_id}")]
    ProductNotInCompany { code: String, company_id: String },

    /// Product is inactive and cannot be sold.
    #[error("Product {0} is inactive")]
    ProductInactive(String),

    /// Insufficient stock to complete the order.
    ///
    /// ## User Workflow
    /// ```text
    /// Submit order (qty: 5)
    ///      │
    ///      ▼
    /// Check stock: available=3
    ///      │
    ///      ▼
    /// InsufficientStock { code: "ELK-001", available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// UI shows: "Only 3 ELK-001 in stock"
    /// ```
    #[error("Insufficient stock for {code}: available {available}, requested {requested}")]
    InsufficientStock {
        code: String,
        available: i64,
        requested: i64,
    },

    /// Discount is larger than subtotal + tax.
    #[error("Discount {discount_cents} exceeds order value {gross_cents}")]
    DiscountExceedsTotal {
        discount_cents: i64,
        gross_cents: i64,
    },

    /// Amount paid does not cover the total.
    #[error("Paid amount {paid_cents} is less than total {total_cents}")]
    Underpayment { paid_cents: i64, total_cents: i64 },

    /// Client-side totals disagree with the server computation.
    #[error("Totals mismatch: {field} expected {expected}, computed {computed}")]
    TotalsMismatch {
        field: &'static str,
        expected: i64,
        computed: i64,
    },

    /// An amount overflowed i64 while pricing the cart.
    #[error("Order amount is too large")]
    AmountOverflow,

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// True for errors about a referenced record that does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CoreError::CompanyNotFound(_)
                | CoreError::OperatorNotFound(_)
                | CoreError::ProductNotFound(_)
        )
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Invalid format (e.g., invalid UUID, invalid email).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            code: "ELK-001".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for ELK-001: available 3, requested 5"
        );

        let err = CoreError::Underpayment {
            paid_cents: 2_000_000,
            total_cents: 2_750_000,
        };
        assert_eq!(
            err.to_string(),
            "Paid amount 2000000 is less than total 2750000"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "code".to_string(),
        };
        assert_eq!(err.to_string(), "code is required");

        let err = ValidationError::Negative {
            field: "stock".to_string(),
        };
        assert_eq!(err.to_string(), "stock must not be negative");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "code".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }

    #[test]
    fn test_not_found_classification() {
        assert!(CoreError::ProductNotFound("x".into()).is_not_found());
        assert!(CoreError::OperatorNotFound("x".into()).is_not_found());
        assert!(!CoreError::EmptyCart.is_not_found());
    }
}
