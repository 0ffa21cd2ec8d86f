//! Carts and cart items.
//!
//! A cart is created lazily on the first add and never deleted. Totals are
//! always recomputed from the current product prices.

use sqlx::PgPool;

use ojasritu_core::{CartId, CartItemId, PricedLine, ProductId, UserId, cart_total};

use super::RepositoryError;
use super::catalog::PRODUCT_COLUMNS;
use crate::models::cart::{CartLine, CartSummary};

pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The user's cart id, if they have one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn cart_id(&self, user_id: UserId) -> Result<Option<CartId>, RepositoryError> {
        let id = sqlx::query_scalar("SELECT id FROM shop.carts WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(self.pool)
            .await?;
        Ok(id)
    }

    /// Add `quantity` of a product, creating the cart and the line as needed.
    ///
    /// A repeated add increments the existing line in a single statement.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn add_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<CartSummary, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let cart_id: CartId = sqlx::query_scalar(
            "INSERT INTO shop.carts (user_id) VALUES ($1) \
             ON CONFLICT (user_id) DO UPDATE SET updated_at = NOW() \
             RETURNING id",
        )
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO shop.cart_items (cart_id, product_id, quantity) VALUES ($1, $2, $3) \
             ON CONFLICT (cart_id, product_id) \
             DO UPDATE SET quantity = shop.cart_items.quantity + EXCLUDED.quantity",
        )
        .bind(cart_id)
        .bind(product_id)
        .bind(quantity)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        self.summary(cart_id).await
    }

    /// Remove an item from the user's cart, returning the product name.
    ///
    /// Items in other users' carts are treated as missing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the item is not in the user's cart.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn remove_item(
        &self,
        user_id: UserId,
        item_id: CartItemId,
    ) -> Result<(String, CartSummary), RepositoryError> {
        let removed: Option<(String, CartId)> = sqlx::query_as(
            "DELETE FROM shop.cart_items ci \
             USING shop.carts c, shop.products p \
             WHERE ci.id = $1 AND ci.cart_id = c.id AND c.user_id = $2 AND p.id = ci.product_id \
             RETURNING p.name, c.id",
        )
        .bind(item_id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        let (name, cart_id) = removed.ok_or(RepositoryError::NotFound)?;
        Ok((name, self.summary(cart_id).await?))
    }

    /// Cart lines with their products, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lines(&self, cart_id: CartId) -> Result<Vec<CartLine>, RepositoryError> {
        let lines = sqlx::query_as::<_, CartLine>(&format!(
            "SELECT ci.id AS item_id, ci.quantity, ci.added_at, {PRODUCT_COLUMNS} \
             FROM shop.cart_items ci \
             JOIN shop.products p ON p.id = ci.product_id \
             LEFT JOIN shop.categories c ON c.id = p.category_id \
             WHERE ci.cart_id = $1 \
             ORDER BY ci.added_at, ci.id"
        ))
        .bind(cart_id)
        .fetch_all(self.pool)
        .await?;
        Ok(lines)
    }

    /// The user's cart priced at current prices. Empty when there is no cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn priced_lines(&self, user_id: UserId) -> Result<Vec<PricedLine>, RepositoryError> {
        let Some(cart_id) = self.cart_id(user_id).await? else {
            return Ok(Vec::new());
        };
        let lines = self.lines(cart_id).await?;
        Ok(lines.iter().map(CartLine::priced).collect())
    }

    async fn summary(&self, cart_id: CartId) -> Result<CartSummary, RepositoryError> {
        let priced: Vec<PricedLine> = self.lines(cart_id).await?.iter().map(CartLine::priced).collect();
        Ok(CartSummary {
            total: cart_total(&priced),
            items_count: priced.len(),
        })
    }
}
