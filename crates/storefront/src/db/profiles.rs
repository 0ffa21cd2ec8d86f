//! User profiles.

use serde::Deserialize;
use sqlx::PgPool;

use ojasritu_core::UserId;

use super::RepositoryError;
use crate::models::user::Profile;

/// Body of `PUT /api/profile`; absent fields keep their value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub bio: Option<String>,
}

pub struct ProfileRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProfileRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Load the profile, provisioning an empty one first if missing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_or_create(&self, user_id: UserId) -> Result<Profile, RepositoryError> {
        sqlx::query(
            "INSERT INTO shop.profiles (user_id) SELECT id FROM shop.users WHERE id = $1 \
             ON CONFLICT (user_id) DO NOTHING",
        )
        .bind(user_id)
        .execute(self.pool)
        .await?;

        sqlx::query_as::<_, Profile>(
            "SELECT p.id, u.username, u.email, u.first_name, u.last_name, p.phone, p.bio \
             FROM shop.profiles p JOIN shop.users u ON u.id = p.user_id \
             WHERE p.user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// The profile phone number, empty when none is on file.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn phone(&self, user_id: UserId) -> Result<String, RepositoryError> {
        let phone: Option<String> =
            sqlx::query_scalar("SELECT phone FROM shop.profiles WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(self.pool)
                .await?;
        Ok(phone.unwrap_or_default())
    }

    /// Update names and profile fields together.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update(
        &self,
        user_id: UserId,
        update: &ProfileUpdate,
    ) -> Result<Profile, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE shop.users SET \
                 first_name = COALESCE($2, first_name), \
                 last_name = COALESCE($3, last_name) \
             WHERE id = $1",
        )
        .bind(user_id)
        .bind(update.first_name.as_deref())
        .bind(update.last_name.as_deref())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        sqlx::query(
            "INSERT INTO shop.profiles (user_id, phone, bio) \
             VALUES ($1, COALESCE($2, ''), COALESCE($3, '')) \
             ON CONFLICT (user_id) DO UPDATE SET \
                 phone = COALESCE($2, shop.profiles.phone), \
                 bio = COALESCE($3, shop.profiles.bio)",
        )
        .bind(user_id)
        .bind(update.phone.as_deref())
        .bind(update.bio.as_deref())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        self.get_or_create(user_id).await
    }
}
