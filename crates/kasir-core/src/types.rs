//! # Domain Types
//!
//! Core domain types used throughout Kasir POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Company      │──►│    Product      │   │      User       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  name           │   │  code (unique)  │   │  email (unique) │       │
//! │  │  status         │   │  price_cents    │   │  role           │       │
//! │  └────────┬────────┘   │  stock          │   └────────┬────────┘       │
//! │           │            └─────────────────┘            │ operator     │
//! │           │                                           │               │
//! │           │            ┌─────────────────┐            │               │
//! │           └───────────►│     Order       │◄───────────┘               │
//! │                        │  order_number   │                            │
//! │                        │  totals (cents) │──► OrderLine (snapshots)   │
//! │                        └─────────────────┘                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID: (code, order_number, email) - human-readable

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::validation::{
    validate_email, validate_name, validate_optional_text, validate_price_cents,
    validate_product_code, validate_stock, validate_unit, ValidationResult,
};

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 1000 bps = 10% (the store-wide rate, see [`crate::pricing::STANDARD_TAX_RATE`])
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

// =============================================================================
// Enumerations
// =============================================================================

/// Lifecycle status shared by companies and products.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    #[default]
    Active,
    Inactive,
}

impl RecordStatus {
    #[inline]
    pub fn is_active(&self) -> bool {
        matches!(self, RecordStatus::Active)
    }
}

/// What an operator is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    #[default]
    Cashier,
}

/// How the customer settled the order.
///
/// Only `paid_cents` is recorded; card and transfer payments are settled on
/// external terminals and normally tender the exact total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Physical cash payment.
    #[default]
    Cash,
    /// Card payment on an external terminal.
    Card,
    /// Bank transfer.
    Transfer,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Transfer => "transfer",
        }
    }
}

// =============================================================================
// Company
// =============================================================================

/// A tenant: an isolated business owning its products and orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Company {
    pub id: String,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub description: Option<String>,
    pub status: RecordStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Company row for management listings, with related record counts.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CompanySummary {
    #[serde(flatten)]
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub company: Company,
    pub product_count: i64,
    pub order_count: i64,
}

/// Input for creating a company.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewCompany {
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: RecordStatus,
}

impl NewCompany {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_name("name", &self.name)?;
        validate_optional_text("address", self.address.as_deref(), 500)?;
        validate_optional_text("phone", self.phone.as_deref(), 20)?;
        if let Some(email) = self.email.as_deref() {
            validate_email(email)?;
        }
        validate_optional_text("description", self.description.as_deref(), 1000)
    }
}

/// Partial update of a company. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CompanyUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<RecordStatus>,
}

impl CompanyUpdate {
    pub fn validate(&self) -> ValidationResult<()> {
        if let Some(name) = self.name.as_deref() {
            validate_name("name", name)?;
        }
        validate_optional_text("address", self.address.as_deref(), 500)?;
        validate_optional_text("phone", self.phone.as_deref(), 20)?;
        if let Some(email) = self.email.as_deref() {
            validate_email(email)?;
        }
        validate_optional_text("description", self.description.as_deref(), 1000)
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product in a company's catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Company that sells this product.
    pub company_id: String,

    /// Display name shown to cashier and on receipt.
    pub name: String,

    /// Business identifier, unique across every company's catalog.
    pub code: String,

    pub description: Option<String>,

    /// Price in cents (smallest currency unit).
    pub price_cents: i64,

    /// Units on hand. Never negative.
    pub stock: i64,

    /// Selling unit ("pcs", "kg", "box", ...).
    pub unit: String,

    pub status: RecordStatus,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Active and in stock: eligible for the cashier screen.
    pub fn is_sellable(&self) -> bool {
        self.status.is_active() && self.stock > 0
    }

    /// Checks whether `quantity` units can be sold right now.
    pub fn can_sell(&self, quantity: i64) -> bool {
        self.status.is_active() && self.stock >= quantity
    }
}

/// Default selling unit for new products.
pub const DEFAULT_UNIT: &str = "pcs";

fn default_unit() -> String {
    DEFAULT_UNIT.to_string()
}

/// Input for creating a product.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewProduct {
    pub company_id: String,
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price_cents: i64,
    #[serde(default)]
    pub stock: i64,
    #[serde(default = "default_unit")]
    pub unit: String,
    #[serde(default)]
    pub status: RecordStatus,
}

impl NewProduct {
    pub fn validate(&self) -> ValidationResult<()> {
        if self.company_id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "company_id".to_string(),
            });
        }
        validate_name("name", &self.name)?;
        validate_product_code(&self.code)?;
        validate_optional_text("description", self.description.as_deref(), 1000)?;
        validate_price_cents(self.price_cents)?;
        validate_stock(self.stock)?;
        validate_unit(&self.unit)
    }
}

/// Partial update of a product. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductUpdate {
    #[serde(default)]
    pub company_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price_cents: Option<i64>,
    #[serde(default)]
    pub stock: Option<i64>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub status: Option<RecordStatus>,
}

impl ProductUpdate {
    pub fn validate(&self) -> ValidationResult<()> {
        if let Some(name) = self.name.as_deref() {
            validate_name("name", name)?;
        }
        if let Some(code) = self.code.as_deref() {
            validate_product_code(code)?;
        }
        validate_optional_text("description", self.description.as_deref(), 1000)?;
        if let Some(price) = self.price_cents {
            validate_price_cents(price)?;
        }
        if let Some(stock) = self.stock {
            validate_stock(stock)?;
        }
        if let Some(unit) = self.unit.as_deref() {
            validate_unit(unit)?;
        }
        Ok(())
    }
}

// =============================================================================
// User (Operator)
// =============================================================================

/// A person who rings up orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct User {
    pub id: String,
    /// Home company, if the operator is bound to one.
    pub company_id: Option<String>,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Input for registering an operator.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewUser {
    #[serde(default)]
    pub company_id: Option<String>,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: UserRole,
}

impl NewUser {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_name("name", &self.name)?;
        validate_email(&self.email)
    }
}

// =============================================================================
// Order
// =============================================================================

/// A committed sale. Written once, never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Order {
    pub id: String,
    /// Human-readable number: `ORD-YYYYMMDD-NNN`.
    pub order_number: String,
    pub company_id: String,
    pub operator_id: String,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
    pub paid_cents: i64,
    pub change_cents: i64,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Order {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    #[inline]
    pub fn change(&self) -> Money {
        Money::from_cents(self.change_cents)
    }
}

/// Order row for listings, joined with company and operator names.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OrderSummary {
    #[serde(flatten)]
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub order: Order,
    pub company_name: String,
    pub operator_name: String,
    pub line_count: i64,
}

// =============================================================================
// Order Line
// =============================================================================

/// A line item in an order.
/// Uses snapshot pattern to freeze product data at time of sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OrderLine {
    pub id: String,
    pub order_id: String,
    /// Source product; `None` once the product has been deleted.
    pub product_id: Option<String>,
    /// Product name at time of sale (frozen).
    pub product_name: String,
    /// Product code at time of sale (frozen).
    pub product_code: String,
    /// Unit price in cents at time of sale (frozen).
    pub unit_price_cents: i64,
    pub quantity: i64,
    /// unit_price × quantity.
    pub subtotal_cents: i64,
    /// Insertion order within the order, starting at 0.
    pub position: i64,
}

impl OrderLine {
    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Returns the line subtotal as Money.
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }
}

// =============================================================================
// Receipt
// =============================================================================

/// Everything needed to render a receipt, exactly as committed.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Receipt {
    pub order: Order,
    pub company: Company,
    pub operator: User,
    pub lines: Vec<OrderLine>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(status: RecordStatus, stock: i64) -> Product {
        let now = Utc::now();
        Product {
            id: "p-1".to_string(),
            company_id: "c-1".to_string(),
            name: "Smartphone X1".to_string(),
            code: "ELK-001".to_string(),
            description: None,
            price_cents: 1_000_000,
            stock,
            unit: DEFAULT_UNIT.to_string(),
            status,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_tax_rate_from_bps() {
        let rate = TaxRate::from_bps(1000);
        assert_eq!(rate.bps(), 1000);
        assert!((rate.percentage() - 10.0).abs() < 0.001);
    }

    #[test]
    fn test_sellable_requires_active_and_stock() {
        assert!(product(RecordStatus::Active, 3).is_sellable());
        assert!(!product(RecordStatus::Active, 0).is_sellable());
        assert!(!product(RecordStatus::Inactive, 3).is_sellable());
    }

    #[test]
    fn test_can_sell() {
        let p = product(RecordStatus::Active, 3);
        assert!(p.can_sell(3));
        assert!(!p.can_sell(4));
        assert!(!product(RecordStatus::Inactive, 10).can_sell(1));
    }

    #[test]
    fn test_enums_serialize_lowercase() {
        assert_eq!(serde_json::to_string(&PaymentMethod::Transfer).unwrap(), "\"transfer\"");
        assert_eq!(serde_json::to_string(&RecordStatus::Inactive).unwrap(), "\"inactive\"");
        assert_eq!(serde_json::to_string(&UserRole::Admin).unwrap(), "\"admin\"");
        let method: PaymentMethod = serde_json::from_str("\"card\"").unwrap();
        assert_eq!(method, PaymentMethod::Card);
    }

    #[test]
    fn test_new_product_defaults() {
        let input: NewProduct = serde_json::from_str(
            r#"{"company_id":"c-1","name":"Beras 5kg","code":"SMB-001","price_cents":7500000}"#,
        )
        .unwrap();
        assert_eq!(input.unit, "pcs");
        assert_eq!(input.stock, 0);
        assert_eq!(input.status, RecordStatus::Active);
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_new_product_rejects_negative_values() {
        let mut input = NewProduct {
            company_id: "c-1".to_string(),
            name: "Laptop".to_string(),
            code: "ELK-002".to_string(),
            description: None,
            price_cents: -1,
            stock: 0,
            unit: "pcs".to_string(),
            status: RecordStatus::Active,
        };
        assert!(input.validate().is_err());

        input.price_cents = 100;
        input.stock = -5;
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_company_validation() {
        let ok = NewCompany {
            name: "Toko Elektronik Jaya".to_string(),
            email: Some("info@elektronikjaya.com".to_string()),
            ..Default::default()
        };
        assert!(ok.validate().is_ok());

        let bad_email = NewCompany {
            name: "Toko".to_string(),
            email: Some("not-an-email".to_string()),
            ..Default::default()
        };
        assert!(bad_email.validate().is_err());

        let update = CompanyUpdate {
            name: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(update.validate().is_err());
    }
}
