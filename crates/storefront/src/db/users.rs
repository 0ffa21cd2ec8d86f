//! User repository for database operations.
//!
//! Accounts, plus the profile row every account gets on creation.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use ojasritu_core::UserId;

use super::RepositoryError;
use crate::models::User;

const USER_COLUMNS: &str = "id, username, email, first_name, last_name, password_hash, \
                            is_staff, is_active, date_joined, last_login";

/// Fields for a new account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: Option<String>,
    pub is_staff: bool,
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM shop.users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(user)
    }

    /// Get a user by exact username.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM shop.users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(self.pool)
        .await?;
        Ok(user)
    }

    /// Get the oldest user whose email matches case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM shop.users \
             WHERE LOWER(email) = LOWER($1) ORDER BY id LIMIT 1"
        ))
        .bind(email)
        .fetch_optional(self.pool)
        .await?;
        Ok(user)
    }

    /// Create a user and its empty profile in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the username is taken.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(&self, new: &NewUser) -> Result<User, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO shop.users \
                 (username, email, first_name, last_name, password_hash, is_staff) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&new.username)
        .bind(&new.email)
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(new.password_hash.as_deref())
        .bind(new.is_staff)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "user"))?;

        sqlx::query("INSERT INTO shop.profiles (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
            .bind(user.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(user)
    }

    /// Create or refresh the account keyed by a verified Google email.
    ///
    /// Names are only overwritten when Google supplies a non-empty value that
    /// differs from the stored one. The profile is provisioned as well.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert_federated(
        &self,
        email: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<User, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO shop.users (username, email, first_name, last_name) \
             VALUES ($1, $1, $2, $3) \
             ON CONFLICT (username) DO UPDATE SET \
                 first_name = CASE WHEN EXCLUDED.first_name <> '' \
                              THEN EXCLUDED.first_name ELSE shop.users.first_name END, \
                 last_name = CASE WHEN EXCLUDED.last_name <> '' \
                             THEN EXCLUDED.last_name ELSE shop.users.last_name END \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(email)
        .bind(first_name)
        .bind(last_name)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO shop.profiles (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
            .bind(user.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(user)
    }

    /// Stamp `last_login` with the current time.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn touch_last_login(&self, id: UserId) -> Result<DateTime<Utc>, RepositoryError> {
        let stamped: Option<DateTime<Utc>> = sqlx::query_scalar(
            "UPDATE shop.users SET last_login = NOW() WHERE id = $1 RETURNING last_login",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        stamped.ok_or(RepositoryError::NotFound)
    }

    /// Replace the password hash and revoke every API token of the user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set_password(&self, id: UserId, password_hash: &str) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("UPDATE shop.users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        sqlx::query("DELETE FROM shop.auth_tokens WHERE user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Count accounts with a given username. Used by tests and tooling.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_by_username(&self, username: &str) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM shop.users WHERE username = $1")
            .bind(username)
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}
