//! Cart types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use ojasritu_core::{CartId, CartItemId, PricedLine, cart_total};

use super::catalog::{Product, ProductView};

/// One cart item joined with its product.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CartLine {
    pub item_id: CartItemId,
    pub quantity: i32,
    pub added_at: DateTime<Utc>,
    #[sqlx(flatten)]
    pub product: Product,
}

impl CartLine {
    /// Price this line at the product's current effective price.
    #[must_use]
    pub fn priced(&self) -> PricedLine {
        PricedLine {
            product_id: self.product.id,
            name: self.product.name.clone(),
            unit_price: self.product.effective_price(),
            quantity: self.quantity,
        }
    }
}

/// API view of a cart item.
#[derive(Debug, Clone, Serialize)]
pub struct CartItemView {
    pub id: CartItemId,
    pub product: ProductView,
    pub quantity: i32,
    pub total_price: Decimal,
    pub added_at: DateTime<Utc>,
}

/// API view of a whole cart. The total is recomputed on every read.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub id: CartId,
    pub items: Vec<CartItemView>,
    pub total_price: Decimal,
    pub items_count: usize,
}

impl CartView {
    #[must_use]
    pub fn new(id: CartId, lines: Vec<CartLine>) -> Self {
        let priced: Vec<PricedLine> = lines.iter().map(CartLine::priced).collect();
        let total_price = cart_total(&priced);
        let items: Vec<CartItemView> = lines
            .into_iter()
            .zip(priced)
            .map(|(line, p)| CartItemView {
                id: line.item_id,
                quantity: line.quantity,
                total_price: p.line_total(),
                added_at: line.added_at,
                product: ProductView::from(line.product),
            })
            .collect();

        Self {
            id,
            items_count: items.len(),
            items,
            total_price,
        }
    }
}

/// Totals reported after a cart mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartSummary {
    pub total: Decimal,
    pub items_count: usize,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::catalog::tests::sample_product;

    #[test]
    fn test_cart_view_total_matches_lines() {
        let mut second = sample_product();
        second.discount_price = None;
        second.price = Decimal::new(12_050, 2);

        let lines = vec![
            CartLine {
                item_id: CartItemId::new(1),
                quantity: 2,
                added_at: Utc::now(),
                product: sample_product(),
            },
            CartLine {
                item_id: CartItemId::new(2),
                quantity: 1,
                added_at: Utc::now(),
                product: second,
            },
        ];

        let view = CartView::new(CartId::new(9), lines);
        assert_eq!(view.items_count, 2);
        // 2 × 450 (discounted) + 1 × 120.50
        assert_eq!(view.total_price, Decimal::new(102_050, 2));
        assert_eq!(
            view.total_price,
            view.items.iter().map(|i| i.total_price).sum::<Decimal>()
        );
    }
}
