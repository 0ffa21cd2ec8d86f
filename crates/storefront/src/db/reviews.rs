//! Product reviews and the rating aggregate.

use serde::Deserialize;
use sqlx::PgPool;

use ojasritu_core::{ProductId, UserId};

use super::RepositoryError;
use crate::models::catalog::Review;

const REVIEW_COLUMNS: &str = "r.id, r.product_id, u.username AS customer_name, r.rating, \
                              r.title, r.comment, r.verified_purchase, r.created_at";

/// Body of `POST /api/products/{slug}/reviews`.
#[derive(Debug, Clone, Deserialize)]
pub struct NewReview {
    pub rating: i16,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub comment: String,
}

pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReviewRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Reviews of a product, newest first. `limit` of `None` returns all.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_product(
        &self,
        product_id: ProductId,
        limit: Option<i64>,
    ) -> Result<Vec<Review>, RepositoryError> {
        let reviews = sqlx::query_as::<_, Review>(&format!(
            "SELECT {REVIEW_COLUMNS} \
             FROM shop.product_reviews r JOIN shop.users u ON u.id = r.user_id \
             WHERE r.product_id = $1 \
             ORDER BY r.created_at DESC, r.id DESC \
             LIMIT $2"
        ))
        .bind(product_id)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;
        Ok(reviews)
    }

    /// Insert a review and recompute the product's rating and review count
    /// in the same transaction.
    ///
    /// The review is marked as a verified purchase when the user has a paid
    /// order containing the product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the user already reviewed it.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(
        &self,
        product_id: ProductId,
        user_id: UserId,
        review: &NewReview,
    ) -> Result<Review, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let verified: bool = sqlx::query_scalar(
            "SELECT EXISTS ( \
                 SELECT 1 FROM shop.orders \
                 WHERE user_id = $1 AND payment_status = 'paid' \
                   AND cart_snapshot @> jsonb_build_array(jsonb_build_object('product_id', $2::int4)) \
             )",
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_one(&mut *tx)
        .await?;

        let review_id: i32 = sqlx::query_scalar(
            "INSERT INTO shop.product_reviews \
                 (product_id, user_id, rating, title, comment, verified_purchase) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
        )
        .bind(product_id)
        .bind(user_id)
        .bind(review.rating)
        .bind(&review.title)
        .bind(&review.comment)
        .bind(verified)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "review"))?;

        sqlx::query(
            "UPDATE shop.products SET \
                 rating = COALESCE(( \
                     SELECT ROUND(AVG(rating)::numeric, 2) FROM shop.product_reviews \
                     WHERE product_id = $1), 0), \
                 total_reviews = ( \
                     SELECT COUNT(*) FROM shop.product_reviews WHERE product_id = $1), \
                 updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(product_id)
        .execute(&mut *tx)
        .await?;

        let created = sqlx::query_as::<_, Review>(&format!(
            "SELECT {REVIEW_COLUMNS} \
             FROM shop.product_reviews r JOIN shop.users u ON u.id = r.user_id \
             WHERE r.id = $1"
        ))
        .bind(review_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(created)
    }
}
