//! Durable API tokens (`Authorization: Token <key>`).

use sqlx::PgPool;

use ojasritu_core::UserId;

use super::RepositoryError;
use crate::models::User;

/// Repository for API tokens. One token per user.
pub struct TokenRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TokenRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Return the user's token, inserting `candidate` if they have none.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_or_create(
        &self,
        user_id: UserId,
        candidate: &str,
    ) -> Result<String, RepositoryError> {
        let key: String = sqlx::query_scalar(
            "INSERT INTO shop.auth_tokens (key, user_id) VALUES ($1, $2) \
             ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id \
             RETURNING key",
        )
        .bind(candidate)
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;
        Ok(key)
    }

    /// Resolve a token to its active owner.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_user(&self, key: &str) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT u.id, u.username, u.email, u.first_name, u.last_name, u.password_hash, \
                    u.is_staff, u.is_active, u.date_joined, u.last_login \
             FROM shop.auth_tokens t \
             JOIN shop.users u ON u.id = t.user_id \
             WHERE t.key = $1 AND u.is_active",
        )
        .bind(key)
        .fetch_optional(self.pool)
        .await?;
        Ok(user)
    }

    /// Delete the user's token. Returns whether one existed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_for_user(&self, user_id: UserId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.auth_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
