//! Cart pricing and order amount rules.
//!
//! Cart totals are always recomputed from priced lines and never stored.
//! An order's amounts satisfy `final = total - discount + tax`, which the
//! database also enforces with a `CHECK` constraint.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::ProductId;

/// One cart line priced at the product's current effective price.
///
/// Orders keep a JSON array of these as their cart snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedLine {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
}

impl PricedLine {
    /// `unit_price × quantity`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Sum of every line total.
#[must_use]
pub fn cart_total(lines: &[PricedLine]) -> Decimal {
    lines.iter().map(PricedLine::line_total).sum()
}

/// Errors from building [`OrderAmounts`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderAmountsError {
    #[error("order amounts cannot be negative")]
    Negative,
    #[error("discount exceeds order total")]
    DiscountExceedsTotal,
}

/// The monetary columns of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAmounts {
    pub total: Decimal,
    pub discount: Decimal,
    pub tax: Decimal,
}

impl OrderAmounts {
    /// Validate a set of amounts.
    ///
    /// # Errors
    ///
    /// Returns [`OrderAmountsError`] if any amount is negative or the
    /// discount is larger than the total.
    pub fn new(total: Decimal, discount: Decimal, tax: Decimal) -> Result<Self, OrderAmountsError> {
        if total.is_sign_negative() || discount.is_sign_negative() || tax.is_sign_negative() {
            return Err(OrderAmountsError::Negative);
        }
        if discount > total {
            return Err(OrderAmountsError::DiscountExceedsTotal);
        }
        Ok(Self {
            total,
            discount,
            tax,
        })
    }

    /// Amounts for a plain cart checkout: no discount and no tax.
    #[must_use]
    pub const fn for_subtotal(total: Decimal) -> Self {
        Self {
            total,
            discount: Decimal::ZERO,
            tax: Decimal::ZERO,
        }
    }

    /// What the customer is charged.
    #[must_use]
    pub fn final_amount(&self) -> Decimal {
        self.total - self.discount + self.tax
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn line(id: i32, price: i64, quantity: i32) -> PricedLine {
        PricedLine {
            product_id: ProductId::new(id),
            name: format!("Product {id}"),
            unit_price: Decimal::new(price, 0),
            quantity,
        }
    }

    #[test]
    fn test_cart_total_sums_lines() {
        let lines = vec![line(1, 100, 2), line(2, 45, 3)];
        assert_eq!(cart_total(&lines), Decimal::new(335, 0));
        assert_eq!(
            cart_total(&lines),
            lines.iter().map(|l| l.unit_price * Decimal::from(l.quantity)).sum::<Decimal>()
        );
    }

    #[test]
    fn test_cart_total_empty_is_zero() {
        assert_eq!(cart_total(&[]), Decimal::ZERO);
    }

    #[test]
    fn test_line_total_keeps_paise() {
        let l = PricedLine {
            unit_price: Decimal::new(19_950, 2),
            ..line(7, 0, 3)
        };
        assert_eq!(l.line_total(), Decimal::new(59_850, 2));
    }

    #[test]
    fn test_final_amount_invariant() {
        let amounts =
            OrderAmounts::new(Decimal::new(1000, 0), Decimal::new(100, 0), Decimal::new(18, 0))
                .unwrap();
        assert_eq!(amounts.final_amount(), Decimal::new(918, 0));

        let plain = OrderAmounts::for_subtotal(Decimal::new(200, 0));
        assert_eq!(plain.final_amount(), plain.total);
    }

    #[test]
    fn test_invalid_amounts() {
        assert_eq!(
            OrderAmounts::new(Decimal::new(10, 0), Decimal::new(11, 0), Decimal::ZERO),
            Err(OrderAmountsError::DiscountExceedsTotal)
        );
        assert_eq!(
            OrderAmounts::new(Decimal::new(-1, 0), Decimal::ZERO, Decimal::ZERO),
            Err(OrderAmountsError::Negative)
        );
    }
}
