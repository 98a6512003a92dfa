//! # Pricing Calculator
//!
//! Turns priced lines and a discount into the order totals.
//!
//! ## Formula
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  subtotal = Σ unit_price × quantity          (exact, integer cents)     │
//! │  tax      = round_half_up(subtotal × 10%)                               │
//! │  total    = subtotal + tax − discount                                   │
//! │  change   = max(0, paid − total)                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The discount is not validated here, so `total` may come out zero or
//! negative. Rejecting such orders is the job of [`crate::checkout`]; the
//! quote endpoint shows the raw numbers.
//!
//! ## Example
//! ```rust
//! use kasir_core::money::Money;
//! use kasir_core::pricing::{change, price, PricedLine};
//!
//! let lines = [
//!     PricedLine::new(Money::from_cents(1_000_000), 2),
//!     PricedLine::new(Money::from_cents(500_000), 1),
//! ];
//! let totals = price(&lines, Money::zero());
//! assert_eq!(totals.total.cents(), 2_750_000);
//! assert_eq!(change(Money::from_cents(3_000_000), totals.total).cents(), 250_000);
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::TaxRate;

/// Store-wide tax rate: 10%, applied to the whole subtotal.
///
/// Not configurable per company.
pub const STANDARD_TAX_RATE: TaxRate = TaxRate::from_bps(1000);

// =============================================================================
// Input & Output
// =============================================================================

/// One cart line reduced to what pricing needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricedLine {
    pub unit_price: Money,
    pub quantity: i64,
}

impl PricedLine {
    pub const fn new(unit_price: Money, quantity: i64) -> Self {
        PricedLine {
            unit_price,
            quantity,
        }
    }

    /// unit_price × quantity.
    #[inline]
    pub fn subtotal(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }
}

/// Computed totals of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PriceBreakdown {
    pub subtotal: Money,
    pub tax: Money,
    pub discount: Money,
    pub total: Money,
}

impl PriceBreakdown {
    /// Change owed when the customer hands over `paid`.
    pub fn change_for(&self, paid: Money) -> Money {
        change(paid, self.total)
    }
}

// =============================================================================
// Calculator
// =============================================================================

/// Prices a cart.
///
/// Amounts are assumed to fit in i64; use [`try_price`] for client input.
pub fn price(lines: &[PricedLine], discount: Money) -> PriceBreakdown {
    let subtotal: Money = lines.iter().map(PricedLine::subtotal).sum();
    let tax = subtotal.calculate_tax(STANDARD_TAX_RATE);

    PriceBreakdown {
        subtotal,
        tax,
        discount,
        total: subtotal + tax - discount,
    }
}

/// Overflow-checked variant of [`price`].
pub fn try_price(lines: &[PricedLine], discount: Money) -> CoreResult<PriceBreakdown> {
    let mut subtotal = Money::zero();
    for line in lines {
        let line_total = line
            .unit_price
            .checked_multiply_quantity(line.quantity)
            .ok_or(CoreError::AmountOverflow)?;
        subtotal = subtotal
            .checked_add(line_total)
            .ok_or(CoreError::AmountOverflow)?;
    }

    let tax = subtotal.calculate_tax(STANDARD_TAX_RATE);
    let total = subtotal
        .cents()
        .checked_add(tax.cents())
        .and_then(|gross| gross.checked_sub(discount.cents()))
        .ok_or(CoreError::AmountOverflow)?;

    Ok(PriceBreakdown {
        subtotal,
        tax,
        discount,
        total: Money::from_cents(total),
    })
}

/// Change owed: `max(0, paid − total)`, saturating at the `i64` bounds.
pub fn change(paid: Money, total: Money) -> Money {
    Money::from_cents(paid.cents().saturating_sub(total.cents()).max(0))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_reference_cart() {
        let lines = [
            PricedLine::new(Money::from_cents(1_000_000), 2),
            PricedLine::new(Money::from_cents(500_000), 1),
        ];
        let totals = price(&lines, Money::zero());

        assert_eq!(totals.subtotal.cents(), 2_500_000);
        assert_eq!(totals.tax.cents(), 250_000);
        assert_eq!(totals.total.cents(), 2_750_000);
        assert_eq!(totals.change_for(Money::from_cents(3_000_000)).cents(), 250_000);
    }

    #[test]
    fn test_discount_may_drive_total_negative() {
        let lines = [PricedLine::new(Money::from_cents(1000), 1)];
        let totals = price(&lines, Money::from_cents(5000));
        assert_eq!(totals.total.cents(), 1000 + 100 - 5000);
    }

    #[test]
    fn test_empty_cart_is_zero() {
        let totals = price(&[], Money::zero());
        assert!(totals.subtotal.is_zero());
        assert!(totals.tax.is_zero());
        assert!(totals.total.is_zero());
    }

    #[test]
    fn test_change_never_negative() {
        assert_eq!(change(Money::from_cents(100), Money::from_cents(500)), Money::zero());
        assert_eq!(change(Money::from_cents(500), Money::from_cents(500)), Money::zero());
        assert_eq!(change(Money::from_cents(700), Money::from_cents(500)).cents(), 200);
    }

    #[test]
    fn test_change_at_extremes_does_not_overflow() {
        let owed = change(Money::from_cents(i64::MAX), Money::from_cents(-1_000));
        assert_eq!(owed.cents(), i64::MAX);
        assert!(change(Money::zero(), Money::from_cents(i64::MAX)).is_zero());
    }

    #[test]
    fn test_try_price_detects_overflow() {
        let lines = [PricedLine::new(Money::from_cents(i64::MAX / 2), 3)];
        assert_eq!(try_price(&lines, Money::zero()), Err(CoreError::AmountOverflow));
    }

    fn arb_line() -> impl Strategy<Value = PricedLine> {
        (0i64..100_000_000, 1i64..=999)
            .prop_map(|(cents, qty)| PricedLine::new(Money::from_cents(cents), qty))
    }

    proptest! {
        #[test]
        fn prop_total_identity(
            lines in prop::collection::vec(arb_line(), 0..20),
            discount in 0i64..1_000_000_000,
        ) {
            let totals = price(&lines, Money::from_cents(discount));
            prop_assert_eq!(
                totals.total.cents(),
                totals.subtotal.cents() + totals.tax.cents() - discount
            );
        }

        #[test]
        fn prop_tax_is_rounded_tenth(lines in prop::collection::vec(arb_line(), 0..20)) {
            let totals = price(&lines, Money::zero());
            let subtotal = totals.subtotal.cents();
            prop_assert_eq!(totals.tax.cents(), (subtotal + 5) / 10);
        }

        #[test]
        fn prop_subtotal_is_sum_of_lines(lines in prop::collection::vec(arb_line(), 0..20)) {
            let expected: i64 = lines.iter().map(|l| l.unit_price.cents() * l.quantity).sum();
            prop_assert_eq!(price(&lines, Money::zero()).subtotal.cents(), expected);
        }

        #[test]
        fn prop_checked_matches_unchecked(
            lines in prop::collection::vec(arb_line(), 0..20),
            discount in 0i64..1_000_000,
        ) {
            let discount = Money::from_cents(discount);
            prop_assert_eq!(try_price(&lines, discount).unwrap(), price(&lines, discount));
        }

        #[test]
        fn prop_change_is_non_negative(paid in -1_000_000i64..1_000_000, total in -1_000_000i64..1_000_000) {
            let owed = change(Money::from_cents(paid), Money::from_cents(total));
            prop_assert!(!owed.is_negative());
            if paid >= total {
                prop_assert_eq!(owed.cents(), paid - total);
            }
        }
    }
}
