//! Consultation bookings.

use chrono::{NaiveDate, NaiveTime};
use sqlx::PgPool;

use ojasritu_core::{ProductId, RebookingId, RebookingStatus, UserId};

use super::RepositoryError;
use crate::models::rebooking::{NewRebooking, Rebooking, RebookingStatusUpdate};

const REBOOKING_SELECT: &str = "SELECT b.id, b.user_id, b.consultation_type, b.scheduled_date, \
         b.scheduled_time, b.duration_minutes, b.health_concerns, b.current_medications, \
         b.allergies, b.dosha_type, b.status, b.therapist_name, b.consultation_notes, \
         COALESCE(ARRAY(SELECT rp.product_id FROM shop.rebooking_products rp \
                        WHERE rp.rebooking_id = b.id ORDER BY rp.product_id), '{}') \
             AS recommended_products, \
         b.consultation_fee, b.is_paid, b.payment_id, b.created_at, b.updated_at \
     FROM shop.rebookings b";

/// Default consultation length in minutes.
pub const DEFAULT_DURATION_MINUTES: i32 = 30;

pub struct RebookingRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> RebookingRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Bookings, upcoming first; all bookings when `owner` is `None`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, owner: Option<UserId>) -> Result<Vec<Rebooking>, RepositoryError> {
        let bookings = sqlx::query_as::<_, Rebooking>(&format!(
            "{REBOOKING_SELECT} WHERE $1::int4 IS NULL OR b.user_id = $1 \
             ORDER BY b.scheduled_date DESC, b.scheduled_time DESC"
        ))
        .bind(owner)
        .fetch_all(self.pool)
        .await?;
        Ok(bookings)
    }

    /// Booking by id; other users' bookings are missing unless `owner` is `None`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        id: RebookingId,
        owner: Option<UserId>,
    ) -> Result<Option<Rebooking>, RepositoryError> {
        let booking = sqlx::query_as::<_, Rebooking>(&format!(
            "{REBOOKING_SELECT} WHERE b.id = $1 AND ($2::int4 IS NULL OR b.user_id = $2)"
        ))
        .bind(id)
        .bind(owner)
        .fetch_optional(self.pool)
        .await?;
        Ok(booking)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(
        &self,
        user_id: UserId,
        new: &NewRebooking,
    ) -> Result<Rebooking, RepositoryError> {
        let id: RebookingId = sqlx::query_scalar(
            "INSERT INTO shop.rebookings \
                 (user_id, consultation_type, scheduled_date, scheduled_time, duration_minutes, \
                  health_concerns, current_medications, allergies, dosha_type) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING id",
        )
        .bind(user_id)
        .bind(new.consultation_type)
        .bind(new.scheduled_date)
        .bind(new.scheduled_time)
        .bind(new.duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES))
        .bind(&new.health_concerns)
        .bind(&new.current_medications)
        .bind(&new.allergies)
        .bind(new.dosha_type)
        .fetch_one(self.pool)
        .await?;

        self.get(id, None).await?.ok_or(RepositoryError::NotFound)
    }

    /// Set the status if the booking is still in `from_any`.
    ///
    /// Returns `None` when the booking is missing or not owned by `owner`,
    /// and `Some(false)` when its status no longer allows the change.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn transition(
        &self,
        id: RebookingId,
        owner: Option<UserId>,
        from_any: &[RebookingStatus],
        to: RebookingStatus,
        reschedule: Option<(NaiveDate, NaiveTime)>,
    ) -> Result<Option<bool>, RepositoryError> {
        let Some(current) = self.get(id, owner).await? else {
            return Ok(None);
        };
        if !from_any.contains(&current.status) {
            return Ok(Some(false));
        }

        let result = sqlx::query(
            "UPDATE shop.rebookings SET \
                 status = $3, \
                 scheduled_date = COALESCE($4, scheduled_date), \
                 scheduled_time = COALESCE($5, scheduled_time), \
                 updated_at = NOW() \
             WHERE id = $1 AND status = $2",
        )
        .bind(id)
        .bind(current.status)
        .bind(to)
        .bind(reschedule.map(|(d, _)| d))
        .bind(reschedule.map(|(_, t)| t))
        .execute(self.pool)
        .await?;

        Ok(Some(result.rows_affected() == 1))
    }

    /// Staff status change with optional therapist details.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the booking does not exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update_status(
        &self,
        id: RebookingId,
        update: &RebookingStatusUpdate,
    ) -> Result<Rebooking, RepositoryError> {
        let result = sqlx::query(
            "UPDATE shop.rebookings SET \
                 status = $2, \
                 therapist_name = COALESCE($3, therapist_name), \
                 consultation_notes = COALESCE($4, consultation_notes), \
                 updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(update.status)
        .bind(update.therapist_name.as_deref())
        .bind(update.consultation_notes.as_deref())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        self.get(id, None).await?.ok_or(RepositoryError::NotFound)
    }

    /// Replace the recommended products of a booking.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the booking does not exist.
    /// Returns `RepositoryError::Database` if the query fails, including
    /// unknown product ids.
    pub async fn set_recommendations(
        &self,
        id: RebookingId,
        product_ids: &[ProductId],
    ) -> Result<Rebooking, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let locked: Option<RebookingId> =
            sqlx::query_scalar("SELECT id FROM shop.rebookings WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Err(RepositoryError::NotFound);
        }

        sqlx::query("DELETE FROM shop.rebooking_products WHERE rebooking_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO shop.rebooking_products (rebooking_id, product_id) \
             SELECT $1, UNNEST($2::int4[]) ON CONFLICT DO NOTHING",
        )
        .bind(id)
        .bind(product_ids)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE shop.rebookings SET updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        self.get(id, None).await?.ok_or(RepositoryError::NotFound)
    }
}
