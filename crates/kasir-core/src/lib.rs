//! # kasir-core: Pure Business Logic for Kasir POS
//!
//! This crate holds the rules of the cashier: money arithmetic, the pricing
//! calculator, and checkout planning. Everything here is a pure function of
//! its inputs; the database crate feeds it authoritative catalog rows and
//! persists whatever plan it produces.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Kasir POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Cashier screen (browser)                     │   │
//! │  │    Catalog ──► Cart ──► Quote ──► Submit ──► Receipt            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ HTTP/JSON                              │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    kasir-server (axum)                          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ kasir-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │  pricing  │  │ checkout  │  │ validation│  │   │
//! │  │   │  Company  │  │ subtotal  │  │   plan    │  │   rules   │  │   │
//! │  │   │   Order   │  │ tax/total │  │  checks   │  │           │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    kasir-db (Database Layer)                    │   │
//! │  │        SQLite queries, migrations, transactional commit         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain records (Company, Product, Order, OrderLine, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`pricing`] - Subtotal / tax / total / change calculator
//! - [`checkout`] - Validates a cart against catalog rows and plans the order
//! - [`error`] - Domain error types
//! - [`validation`] - Field-level input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use kasir_core::money::Money;
//! use kasir_core::pricing::{price, PricedLine};
//!
//! let lines = [
//!     PricedLine::new(Money::from_cents(1_000_000), 2),
//!     PricedLine::new(Money::from_cents(500_000), 1),
//! ];
//! let breakdown = price(&lines, Money::zero());
//!
//! assert_eq!(breakdown.subtotal.cents(), 2_500_000);
//! assert_eq!(breakdown.tax.cents(), 250_000);
//! assert_eq!(breakdown.total.cents(), 2_750_000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod error;
pub mod money;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use checkout::{CheckoutLine, CheckoutPlan, CheckoutRequest, ExpectedTotals, PlannedLine, Quote};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use pricing::{PriceBreakdown, PricedLine, STANDARD_TAX_RATE};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines allowed in a single checkout.
///
/// ## Business Reason
/// Prevents runaway carts and keeps the commit transaction short.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single product in one checkout.
///
/// ## Business Reason
/// Catches fat-finger entries (typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Largest discount or payment accepted on a checkout, in cents.
///
/// ## Business Reason
/// Keeps every totals and change computation inside `i64`.
pub const MAX_AMOUNT_CENTS: i64 = 1_000_000_000_000_000;

/// Prefix of every human-readable order number.
pub const ORDER_NUMBER_PREFIX: &str = "ORD";

/// Maximum length of free-text order notes.
pub const MAX_NOTES_LEN: usize = 500;
