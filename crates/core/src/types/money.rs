//! Product pricing with decimal arithmetic.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// ISO 4217 currency codes accepted by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    INR,
}

impl CurrencyCode {
    /// The ISO code as sent to the payment gateway.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::INR => "INR",
        }
    }

    /// Display symbol.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::INR => "₹",
        }
    }
}

/// Errors from constructing a [`ProductPricing`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PricingError {
    #[error("price cannot be negative")]
    NegativePrice,
    #[error("discount price cannot be negative")]
    NegativeDiscount,
    #[error("discount price must not exceed the regular price")]
    DiscountExceedsPrice,
}

/// A product's list price plus an optional discounted price.
///
/// The discount never exceeds the list price. Constructing one that does is
/// an error, so every `ProductPricing` in circulation is consistent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPricing", into = "RawPricing")]
pub struct ProductPricing {
    price: Decimal,
    discount_price: Option<Decimal>,
}

#[derive(Serialize, Deserialize)]
struct RawPricing {
    price: Decimal,
    discount_price: Option<Decimal>,
}

impl ProductPricing {
    /// Validate and build a pricing pair.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError`] if either amount is negative or the discount
    /// is above the list price.
    pub fn new(price: Decimal, discount_price: Option<Decimal>) -> Result<Self, PricingError> {
        if price.is_sign_negative() {
            return Err(PricingError::NegativePrice);
        }
        if let Some(discount) = discount_price {
            if discount.is_sign_negative() {
                return Err(PricingError::NegativeDiscount);
            }
            if discount > price {
                return Err(PricingError::DiscountExceedsPrice);
            }
        }
        Ok(Self {
            price,
            discount_price,
        })
    }

    #[must_use]
    pub const fn price(&self) -> Decimal {
        self.price
    }

    #[must_use]
    pub const fn discount_price(&self) -> Option<Decimal> {
        self.discount_price
    }

    /// The price a customer actually pays per unit.
    #[must_use]
    pub fn effective_price(&self) -> Decimal {
        self.discount_price.unwrap_or(self.price)
    }

    /// Discount as a whole percentage of the list price, rounded down.
    ///
    /// Zero when there is no discount or the list price is zero.
    #[must_use]
    pub fn discount_percentage(&self) -> u32 {
        let Some(discount) = self.discount_price else {
            return 0;
        };
        if self.price.is_zero() {
            return 0;
        }
        let pct = ((self.price - discount) / self.price * Decimal::ONE_HUNDRED).floor();
        pct.to_u32().unwrap_or(0)
    }
}

impl TryFrom<RawPricing> for ProductPricing {
    type Error = PricingError;

    fn try_from(raw: RawPricing) -> Result<Self, Self::Error> {
        Self::new(raw.price, raw.discount_price)
    }
}

impl From<ProductPricing> for RawPricing {
    fn from(p: ProductPricing) -> Self {
        Self {
            price: p.price,
            discount_price: p.discount_price,
        }
    }
}
