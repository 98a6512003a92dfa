//! # Checkout Planning
//!
//! Validates a submitted cart against authoritative catalog rows and turns it
//! into a [`CheckoutPlan`]: the exact rows the database layer will write.
//!
//! ## Where This Runs
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  kasir-db commit transaction (write lock held)                          │
//! │                                                                         │
//! │   1. allocate order number                                              │
//! │   2. load company + products  ─────────┐                                │
//! │                                        ▼                                │
//! │                         ┌───────────────────────────┐                   │
//! │                         │ CheckoutPlan::build       │ ◄── THIS MODULE   │
//! │                         │  • shape (lines, amounts) │                   │
//! │                         │  • ownership + status     │                   │
//! │                         │  • stock                  │                   │
//! │                         │  • server-side pricing    │                   │
//! │                         │  • expected totals        │                   │
//! │                         │  • payment covers total   │                   │
//! │                         └─────────────┬─────────────┘                   │
//! │                                       ▼                                 │
//! │   3. insert header   4. insert lines + guarded decrement   5. COMMIT    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Planning is pure: it reads nothing but its arguments, so every rule is
//! unit-testable without a database.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::pricing::{change, try_price, PriceBreakdown, PricedLine};
use crate::types::{Company, PaymentMethod, Product};
use crate::validation::{validate_amount_cents, validate_notes};
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

// =============================================================================
// Request Types
// =============================================================================

/// One requested line: which product and how many.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CheckoutLine {
    pub product_id: String,
    pub quantity: i64,
}

/// Totals the client displayed to the cashier.
///
/// Only compared against the server computation, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ExpectedTotals {
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
}

/// A cart submitted for quoting or committing.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CheckoutRequest {
    pub company_id: String,
    pub lines: Vec<CheckoutLine>,
    #[serde(default)]
    pub discount_cents: i64,
    #[serde(default)]
    pub paid_cents: i64,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default, alias = "expected_totals")]
    pub expected: Option<ExpectedTotals>,
}

impl CheckoutRequest {
    /// Checks everything that does not need catalog state and merges
    /// duplicate product lines (first occurrence keeps its position).
    pub fn normalized_lines(&self) -> CoreResult<Vec<CheckoutLine>> {
        if self.lines.is_empty() {
            return Err(CoreError::EmptyCart);
        }

        validate_amount_cents("discount", self.discount_cents)?;
        validate_amount_cents("paid", self.paid_cents)?;
        validate_notes(self.notes.as_deref())?;

        let mut merged: Vec<CheckoutLine> = Vec::with_capacity(self.lines.len());
        let mut index: HashMap<&str, usize> = HashMap::new();

        for line in &self.lines {
            check_quantity(&line.product_id, line.quantity)?;

            match index.get(line.product_id.as_str()) {
                Some(&at) => {
                    let entry = &mut merged[at];
                    entry.quantity += line.quantity;
                    check_quantity(&entry.product_id, entry.quantity)?;
                }
                None => {
                    index.insert(line.product_id.as_str(), merged.len());
                    merged.push(line.clone());
                }
            }
        }

        if merged.len() > MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_ITEMS,
            });
        }

        Ok(merged)
    }

    /// Distinct product ids referenced by the cart, in request order.
    pub fn product_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = Vec::with_capacity(self.lines.len());
        for line in &self.lines {
            if !ids.contains(&line.product_id) {
                ids.push(line.product_id.clone());
            }
        }
        ids
    }

    /// Notes with surrounding whitespace removed; blank becomes `None`.
    fn clean_notes(&self) -> Option<String> {
        self.notes
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
    }
}

fn check_quantity(product_id: &str, quantity: i64) -> CoreResult<()> {
    if !(1..=MAX_ITEM_QUANTITY).contains(&quantity) {
        return Err(CoreError::InvalidQuantity {
            product_id: product_id.to_string(),
            requested: quantity,
            max: MAX_ITEM_QUANTITY,
        });
    }
    Ok(())
}

// =============================================================================
// Plan Types
// =============================================================================

/// A validated line with its frozen product snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PlannedLine {
    pub product_id: String,
    pub product_name: String,
    pub product_code: String,
    pub unit_price: Money,
    pub quantity: i64,
    pub subtotal: Money,
}

/// A priced cart, without any payment checks. Returned by the quote endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Quote {
    pub lines: Vec<PlannedLine>,
    pub totals: PriceBreakdown,
    pub change: Money,
}

/// A cart that passed every rule and is ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutPlan {
    pub company_id: String,
    pub lines: Vec<PlannedLine>,
    pub totals: PriceBreakdown,
    pub paid: Money,
    pub change: Money,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
}

impl CheckoutPlan {
    /// Prices a cart against catalog rows without enforcing payment.
    ///
    /// `products` must hold the current rows for (at least) every product
    /// the request references; missing ids are reported as not found.
    pub fn quote(
        company: &Company,
        products: &[Product],
        request: &CheckoutRequest,
    ) -> CoreResult<Quote> {
        let lines = plan_lines(company, products, request)?;

        let priced: Vec<PricedLine> = lines
            .iter()
            .map(|l| PricedLine::new(l.unit_price, l.quantity))
            .collect();
        let totals = try_price(&priced, Money::from_cents(request.discount_cents))?;

        Ok(Quote {
            lines,
            change: change(Money::from_cents(request.paid_cents), totals.total),
            totals,
        })
    }

    /// Runs every checkout rule and produces the rows to persist.
    ///
    /// ## Errors
    /// Any [`CoreError`]: the caller must not write anything.
    pub fn build(
        company: &Company,
        products: &[Product],
        request: &CheckoutRequest,
    ) -> CoreResult<CheckoutPlan> {
        let Quote {
            lines,
            totals,
            change,
        } = Self::quote(company, products, request)?;

        if totals.total.is_negative() {
            return Err(CoreError::DiscountExceedsTotal {
                discount_cents: totals.discount.cents(),
                gross_cents: (totals.subtotal + totals.tax).cents(),
            });
        }

        if let Some(expected) = request.expected {
            compare_expected(&expected, &totals)?;
        }

        let paid = Money::from_cents(request.paid_cents);
        if paid < totals.total {
            return Err(CoreError::Underpayment {
                paid_cents: paid.cents(),
                total_cents: totals.total.cents(),
            });
        }

        Ok(CheckoutPlan {
            company_id: company.id.clone(),
            lines,
            totals,
            paid,
            change,
            payment_method: request.payment_method,
            notes: request.clean_notes(),
        })
    }

    /// Total units across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }
}

fn plan_lines(
    company: &Company,
    products: &[Product],
    request: &CheckoutRequest,
) -> CoreResult<Vec<PlannedLine>> {
    let requested = request.normalized_lines()?;

    if request.company_id != company.id {
        return Err(CoreError::CompanyNotFound(request.company_id.clone()));
    }
    if !company.status.is_active() {
        return Err(CoreError::CompanyInactive(company.id.clone()));
    }

    let catalog: HashMap<&str, &Product> = products.iter().map(|p| (p.id.as_str(), p)).collect();

    requested
        .into_iter()
        .map(|line| {
            let product = catalog
                .get(line.product_id.as_str())
                .ok_or_else(|| CoreError::ProductNotFound(line.product_id.clone()))?;

            if product.company_id != company.id {
                return Err(CoreError::ProductNotInCompany {
                    code: product.code.clone(),
                    company_id: company.id.clone(),
                });
            }
            if !product.status.is_active() {
                return Err(CoreError::ProductInactive(product.code.clone()));
            }
            if line.quantity > product.stock {
                return Err(CoreError::InsufficientStock {
                    code: product.code.clone(),
                    available: product.stock,
                    requested: line.quantity,
                });
            }

            let unit_price = product.price();
            let subtotal = unit_price
                .checked_multiply_quantity(line.quantity)
                .ok_or(CoreError::AmountOverflow)?;

            Ok(PlannedLine {
                product_id: product.id.clone(),
                product_name: product.name.clone(),
                product_code: product.code.clone(),
                unit_price,
                quantity: line.quantity,
                subtotal,
            })
        })
        .collect()
}

fn compare_expected(expected: &ExpectedTotals, totals: &PriceBreakdown) -> CoreResult<()> {
    let pairs = [
        ("subtotal", expected.subtotal_cents, totals.subtotal.cents()),
        ("tax", expected.tax_cents, totals.tax.cents()),
        ("total", expected.total_cents, totals.total.cents()),
    ];

    for (field, expected, computed) in pairs {
        if expected != computed {
            return Err(CoreError::TotalsMismatch {
                field,
                expected,
                computed,
            });
        }
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::types::RecordStatus;
    use chrono::Utc;

    fn company(status: RecordStatus) -> Company {
        let now = Utc::now();
        Company {
            id: "c-1".to_string(),
            name: "Toko Elektronik Jaya".to_string(),
            address: None,
            phone: None,
            email: None,
            description: None,
            status,
            created_at: now,
            updated_at: now,
        }
    }

    fn product(id: &str, code: &str, price_cents: i64, stock: i64) -> Product {
        let now = Utc::now();
        Product {
            id: id.to_string(),
            company_id: "c-1".to_string(),
            name: format!("Product {}", code),
            code: code.to_string(),
            description: None,
            price_cents,
            stock,
            unit: "pcs".to_string(),
            status: RecordStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    fn catalog() -> Vec<Product> {
        vec![
            product("p-a", "ELK-001", 1_000_000, 10),
            product("p-b", "ELK-002", 500_000, 5),
        ]
    }

    fn request(lines: &[(&str, i64)], paid_cents: i64) -> CheckoutRequest {
        CheckoutRequest {
            company_id: "c-1".to_string(),
            lines: lines
                .iter()
                .map(|(id, qty)| CheckoutLine {
                    product_id: id.to_string(),
                    quantity: *qty,
                })
                .collect(),
            discount_cents: 0,
            paid_cents,
            payment_method: PaymentMethod::Cash,
            notes: None,
            expected: None,
        }
    }

    #[test]
    fn test_reference_scenario() {
        let plan = CheckoutPlan::build(
            &company(RecordStatus::Active),
            &catalog(),
            &request(&[("p-a", 2), ("p-b", 1)], 3_000_000),
        )
        .unwrap();

        assert_eq!(plan.totals.subtotal.cents(), 2_500_000);
        assert_eq!(plan.totals.tax.cents(), 250_000);
        assert_eq!(plan.totals.total.cents(), 2_750_000);
        assert_eq!(plan.change.cents(), 250_000);
        assert_eq!(plan.lines.len(), 2);
        assert_eq!(plan.lines[0].product_code, "ELK-001");
        assert_eq!(plan.lines[0].subtotal.cents(), 2_000_000);
        assert_eq!(plan.total_quantity(), 3);
    }

    #[test]
    fn test_lines_sum_to_subtotal() {
        let plan = CheckoutPlan::build(
            &company(RecordStatus::Active),
            &catalog(),
            &request(&[("p-a", 3), ("p-b", 4)], 100_000_000),
        )
        .unwrap();
        let sum: Money = plan.lines.iter().map(|l| l.subtotal).sum();
        assert_eq!(sum, plan.totals.subtotal);
    }

    #[test]
    fn test_underpayment_rejected() {
        let err = CheckoutPlan::build(
            &company(RecordStatus::Active),
            &catalog(),
            &request(&[("p-a", 2), ("p-b", 1)], 2_000_000),
        )
        .unwrap_err();
        assert_eq!(
            err,
            CoreError::Underpayment {
                paid_cents: 2_000_000,
                total_cents: 2_750_000
            }
        );
    }

    #[test]
    fn test_exact_payment_gives_zero_change() {
        let plan = CheckoutPlan::build(
            &company(RecordStatus::Active),
            &catalog(),
            &request(&[("p-b", 1)], 550_000),
        )
        .unwrap();
        assert!(plan.change.is_zero());
    }

    #[test]
    fn test_empty_cart_rejected() {
        let err = CheckoutPlan::build(&company(RecordStatus::Active), &catalog(), &request(&[], 0))
            .unwrap_err();
        assert_eq!(err, CoreError::EmptyCart);
    }

    #[test]
    fn test_quantity_bounds() {
        let active = company(RecordStatus::Active);
        for qty in [0, -3, 1000] {
            let err = CheckoutPlan::build(&active, &catalog(), &request(&[("p-a", qty)], 0))
                .unwrap_err();
            assert!(matches!(err, CoreError::InvalidQuantity { .. }), "qty {}", qty);
        }
    }

    #[test]
    fn test_duplicate_lines_are_merged() {
        let plan = CheckoutPlan::build(
            &company(RecordStatus::Active),
            &catalog(),
            &request(&[("p-a", 1), ("p-b", 1), ("p-a", 2)], 100_000_000),
        )
        .unwrap();
        assert_eq!(plan.lines.len(), 2);
        assert_eq!(plan.lines[0].product_id, "p-a");
        assert_eq!(plan.lines[0].quantity, 3);
    }

    #[test]
    fn test_merged_quantity_checked_against_stock() {
        let err = CheckoutPlan::build(
            &company(RecordStatus::Active),
            &catalog(),
            &request(&[("p-b", 3), ("p-b", 3)], 100_000_000),
        )
        .unwrap_err();
        assert_eq!(
            err,
            CoreError::InsufficientStock {
                code: "ELK-002".to_string(),
                available: 5,
                requested: 6
            }
        );
    }

    #[test]
    fn test_too_many_distinct_lines() {
        let products: Vec<Product> = (0..=MAX_CART_ITEMS)
            .map(|i| product(&format!("p-{}", i), &format!("C-{}", i), 100, 10))
            .collect();
        let mut req = request(&[], 100_000_000);
        req.lines = products
            .iter()
            .map(|p| CheckoutLine {
                product_id: p.id.clone(),
                quantity: 1,
            })
            .collect();

        let err = CheckoutPlan::build(&company(RecordStatus::Active), &products, &req).unwrap_err();
        assert_eq!(err, CoreError::CartTooLarge { max: MAX_CART_ITEMS });
    }

    #[test]
    fn test_unknown_product() {
        let err = CheckoutPlan::build(
            &company(RecordStatus::Active),
            &catalog(),
            &request(&[("p-zzz", 1)], 100_000_000),
        )
        .unwrap_err();
        assert_eq!(err, CoreError::ProductNotFound("p-zzz".to_string()));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_product_from_other_company() {
        let mut products = catalog();
        products[0].company_id = "c-2".to_string();
        let err = CheckoutPlan::build(
            &company(RecordStatus::Active),
            &products,
            &request(&[("p-a", 1)], 100_000_000),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::ProductNotInCompany { .. }));
    }

    #[test]
    fn test_inactive_product_and_company() {
        let mut products = catalog();
        products[1].status = RecordStatus::Inactive;
        let err = CheckoutPlan::build(
            &company(RecordStatus::Active),
            &products,
            &request(&[("p-b", 1)], 100_000_000),
        )
        .unwrap_err();
        assert_eq!(err, CoreError::ProductInactive("ELK-002".to_string()));

        let err = CheckoutPlan::build(
            &company(RecordStatus::Inactive),
            &catalog(),
            &request(&[("p-a", 1)], 100_000_000),
        )
        .unwrap_err();
        assert_eq!(err, CoreError::CompanyInactive("c-1".to_string()));
    }

    #[test]
    fn test_negative_amounts_rejected() {
        let mut req = request(&[("p-a", 1)], 100_000_000);
        req.discount_cents = -1;
        let err = CheckoutPlan::build(&company(RecordStatus::Active), &catalog(), &req).unwrap_err();
        assert!(matches!(err, CoreError::Validation(ValidationError::Negative { .. })));

        let req = request(&[("p-a", 1)], -5);
        let err = CheckoutPlan::build(&company(RecordStatus::Active), &catalog(), &req).unwrap_err();
        assert!(matches!(err, CoreError::Validation(ValidationError::Negative { .. })));
    }

    #[test]
    fn test_oversized_amounts_rejected() {
        let mut req = request(&[("p-a", 1)], i64::MAX);
        req.discount_cents = i64::MAX;

        let err = CheckoutPlan::quote(&company(RecordStatus::Active), &catalog(), &req).unwrap_err();
        assert!(matches!(err, CoreError::Validation(ValidationError::OutOfRange { .. })));

        let err = CheckoutPlan::build(&company(RecordStatus::Active), &catalog(), &req).unwrap_err();
        assert!(matches!(err, CoreError::Validation(ValidationError::OutOfRange { .. })));

        req.paid_cents = crate::MAX_AMOUNT_CENTS;
        req.discount_cents = crate::MAX_AMOUNT_CENTS;
        let quote = CheckoutPlan::quote(&company(RecordStatus::Active), &catalog(), &req).unwrap();
        assert!(quote.totals.total.is_negative());
        assert_eq!(
            quote.change.cents(),
            crate::MAX_AMOUNT_CENTS - quote.totals.total.cents()
        );
    }

    #[test]
    fn test_discount_exceeding_total_rejected_but_quoted() {
        let mut req = request(&[("p-b", 1)], 0);
        req.discount_cents = 600_000;

        let err = CheckoutPlan::build(&company(RecordStatus::Active), &catalog(), &req).unwrap_err();
        assert_eq!(
            err,
            CoreError::DiscountExceedsTotal {
                discount_cents: 600_000,
                gross_cents: 550_000
            }
        );

        let quote = CheckoutPlan::quote(&company(RecordStatus::Active), &catalog(), &req).unwrap();
        assert_eq!(quote.totals.total.cents(), -50_000);
    }

    #[test]
    fn test_discount_equal_to_gross_is_free_order() {
        let mut req = request(&[("p-b", 1)], 0);
        req.discount_cents = 550_000;
        let plan = CheckoutPlan::build(&company(RecordStatus::Active), &catalog(), &req).unwrap();
        assert!(plan.totals.total.is_zero());
    }

    #[test]
    fn test_expected_totals() {
        let mut req = request(&[("p-a", 2), ("p-b", 1)], 3_000_000);
        req.expected = Some(ExpectedTotals {
            subtotal_cents: 2_500_000,
            tax_cents: 250_000,
            total_cents: 2_750_000,
        });
        assert!(CheckoutPlan::build(&company(RecordStatus::Active), &catalog(), &req).is_ok());

        req.expected = Some(ExpectedTotals {
            subtotal_cents: 2_500_000,
            tax_cents: 0,
            total_cents: 2_500_000,
        });
        let err = CheckoutPlan::build(&company(RecordStatus::Active), &catalog(), &req).unwrap_err();
        assert_eq!(
            err,
            CoreError::TotalsMismatch {
                field: "tax",
                expected: 0,
                computed: 250_000
            }
        );
    }

    #[test]
    fn test_notes_trimmed_and_bounded() {
        let mut req = request(&[("p-a", 1)], 100_000_000);
        req.notes = Some("  member  ".to_string());
        let plan = CheckoutPlan::build(&company(RecordStatus::Active), &catalog(), &req).unwrap();
        assert_eq!(plan.notes.as_deref(), Some("member"));

        req.notes = Some("   ".to_string());
        let plan = CheckoutPlan::build(&company(RecordStatus::Active), &catalog(), &req).unwrap();
        assert_eq!(plan.notes, None);

        req.notes = Some("n".repeat(501));
        assert!(CheckoutPlan::build(&company(RecordStatus::Active), &catalog(), &req).is_err());
    }

    #[test]
    fn test_request_accepts_expected_totals_alias() {
        let req: CheckoutRequest = serde_json::from_str(
            r#"{
                "company_id": "c-1",
                "lines": [{"product_id": "p-a", "quantity": 1}],
                "paid_cents": 1100000,
                "payment_method": "card",
                "expected_totals": {"subtotal_cents": 1000000, "tax_cents": 100000, "total_cents": 1100000}
            }"#,
        )
        .unwrap();
        assert_eq!(req.payment_method, PaymentMethod::Card);
        assert_eq!(req.discount_cents, 0);
        assert!(req.expected.is_some());
        assert_eq!(req.product_ids(), vec!["p-a".to_string()]);
    }
}
