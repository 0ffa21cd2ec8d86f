//! Orders.
//!
//! `payment_status` only changes through [`OrderRepository::compare_and_set_payment`],
//! which the checkout service drives from the transition guard in
//! `ojasritu_core::payment`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;

use ojasritu_core::{OrderId, OrderStatus, PaymentStatus, UserId};

use super::RepositoryError;
use crate::models::order::{NewOrder, Order, OrderStatusUpdate};

const ORDER_COLUMNS: &str = "id, order_id, user_id, shipping_address, billing_address, \
     phone_number, total_amount, discount_amount, tax_amount, final_amount, status, \
     payment_method, payment_status, transaction_id, gateway_order_id, gateway_session_id, \
     cart_snapshot, special_instructions, admin_notes, tracking_number, estimated_delivery, \
     created_at, updated_at";

/// A payment status change to apply with compare-and-set.
#[derive(Debug, Clone, Copy)]
pub struct PaymentTransition<'t> {
    pub expected: PaymentStatus,
    /// Fulfillment status the decision was based on.
    pub expected_order: OrderStatus,
    pub to: PaymentStatus,
    pub order_status: Option<OrderStatus>,
    pub transaction_id: Option<&'t str>,
}

pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a pending order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the order id is already used.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(&self, new: &NewOrder) -> Result<Order, RepositoryError> {
        insert_order(&mut *self.pool.acquire().await?, new).await
    }

    /// Insert a pending order and empty the user's cart atomically.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the order id is already used.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create_and_clear_cart(&self, new: &NewOrder) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let order = insert_order(&mut *tx, new).await?;

        sqlx::query(
            "DELETE FROM shop.cart_items ci USING shop.carts c \
             WHERE ci.cart_id = c.id AND c.user_id = $1",
        )
        .bind(new.user)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(order)
    }

    /// Record the gateway's payment session for an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set_gateway_session(
        &self,
        id: OrderId,
        session_id: &str,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE shop.orders SET gateway_session_id = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(session_id)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_gateway_order_id(
        &self,
        gateway_order_id: &str,
    ) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM shop.orders WHERE gateway_order_id = $1"
        ))
        .bind(gateway_order_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(order)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM shop.orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(order)
    }

    /// Order by public reference. With `owner` set, other users' orders are
    /// reported as missing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_reference(
        &self,
        order_id: &str,
        owner: Option<UserId>,
    ) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM shop.orders \
             WHERE order_id = $1 AND ($2::int4 IS NULL OR user_id = $2)"
        ))
        .bind(order_id)
        .bind(owner)
        .fetch_optional(self.pool)
        .await?;
        Ok(order)
    }

    /// Orders newest first; all orders when `owner` is `None`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, owner: Option<UserId>) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM shop.orders \
             WHERE $1::int4 IS NULL OR user_id = $1 \
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(owner)
        .fetch_all(self.pool)
        .await?;
        Ok(orders)
    }

    /// Move `payment_status` only if the row still holds the expected
    /// payment and fulfillment statuses.
    ///
    /// Returns `false` when another writer changed the row first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn compare_and_set_payment(
        &self,
        id: OrderId,
        transition: PaymentTransition<'_>,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE shop.orders SET \
                 payment_status = $3, \
                 status = COALESCE($4, status), \
                 transaction_id = COALESCE($5, transaction_id), \
                 updated_at = NOW() \
             WHERE id = $1 AND payment_status = $2 AND status = $6",
        )
        .bind(id)
        .bind(transition.expected)
        .bind(transition.to)
        .bind(transition.order_status)
        .bind(transition.transaction_id)
        .bind(transition.expected_order)
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Staff fulfillment update.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no order has the reference.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update_status(
        &self,
        order_id: &str,
        update: &OrderStatusUpdate,
    ) -> Result<Order, RepositoryError> {
        sqlx::query_as::<_, Order>(&format!(
            "UPDATE shop.orders SET \
                 status = $2, \
                 tracking_number = COALESCE($3, tracking_number), \
                 estimated_delivery = COALESCE($4, estimated_delivery), \
                 admin_notes = COALESCE($5, admin_notes), \
                 updated_at = NOW() \
             WHERE order_id = $1 \
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(order_id)
        .bind(update.status)
        .bind(update.tracking_number.as_deref())
        .bind(update.estimated_delivery)
        .bind(update.admin_notes.as_deref())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Gateway orders still pending without a payment session, created
    /// before `cutoff`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn stale_pending(&self, cutoff: DateTime<Utc>) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM shop.orders \
             WHERE payment_status = 'pending' AND gateway_session_id IS NULL \
               AND payment_method = 'cashfree' AND created_at < $1 \
             ORDER BY created_at"
        ))
        .bind(cutoff)
        .fetch_all(self.pool)
        .await?;
        Ok(orders)
    }

    /// Count orders of a user. Used by tests and tooling.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_for_user(&self, user_id: UserId) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM shop.orders WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}

async fn insert_order(
    conn: &mut sqlx::PgConnection,
    new: &NewOrder,
) -> Result<Order, RepositoryError> {
    sqlx::query_as::<_, Order>(&format!(
        "INSERT INTO shop.orders \
             (order_id, user_id, shipping_address, billing_address, phone_number, \
              total_amount, discount_amount, tax_amount, final_amount, payment_method, \
              gateway_order_id, cart_snapshot, special_instructions) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
         RETURNING {ORDER_COLUMNS}"
    ))
    .bind(&new.order_id)
    .bind(new.user)
    .bind(&new.shipping_address)
    .bind(&new.billing_address)
    .bind(&new.phone_number)
    .bind(new.amounts.total)
    .bind(new.amounts.discount)
    .bind(new.amounts.tax)
    .bind(new.amounts.final_amount())
    .bind(new.payment_method)
    .bind(new.gateway_order_id.as_deref())
    .bind(Json(&new.lines))
    .bind(&new.special_instructions)
    .fetch_one(conn)
    .await
    .map_err(|e| RepositoryError::from_unique(e, "order"))
}
