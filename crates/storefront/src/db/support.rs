//! Contact messages and the Gurukul notify-me list.

use sqlx::PgPool;

use super::RepositoryError;
use crate::models::support::{ContactMessage, GurukulSignup, NewContactMessage};

const CONTACT_COLUMNS: &str = "id, name, email, phone, subject, message, category, \
                               is_resolved, admin_response, created_at";

pub struct SupportRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SupportRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a contact message. `email` is expected to be normalized.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create_contact(
        &self,
        message: &NewContactMessage,
        email: &str,
    ) -> Result<ContactMessage, RepositoryError> {
        let created = sqlx::query_as::<_, ContactMessage>(&format!(
            "INSERT INTO shop.contact_messages (name, email, phone, subject, message, category) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {CONTACT_COLUMNS}"
        ))
        .bind(message.name.trim())
        .bind(email)
        .bind(message.phone.trim())
        .bind(message.subject.trim())
        .bind(message.message.trim())
        .bind(message.category)
        .fetch_one(self.pool)
        .await?;
        Ok(created)
    }

    /// Contact messages newest first; only those sent from `email` when set.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_contacts(
        &self,
        email: Option<&str>,
    ) -> Result<Vec<ContactMessage>, RepositoryError> {
        let messages = sqlx::query_as::<_, ContactMessage>(&format!(
            "SELECT {CONTACT_COLUMNS} FROM shop.contact_messages \
             WHERE $1::text IS NULL OR LOWER(email) = LOWER($1) \
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(email)
        .fetch_all(self.pool)
        .await?;
        Ok(messages)
    }

    /// Add an email to the notify-me list, refreshing the name if present.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert_gurukul(&self, name: &str, email: &str) -> Result<GurukulSignup, RepositoryError> {
        let signup = sqlx::query_as::<_, GurukulSignup>(
            "INSERT INTO shop.gurukul_signups (name, email) VALUES ($1, $2) \
             ON CONFLICT (email) DO UPDATE SET \
                 name = CASE WHEN EXCLUDED.name <> '' THEN EXCLUDED.name \
                        ELSE shop.gurukul_signups.name END \
             RETURNING id, (xmax = 0) AS created",
        )
        .bind(name)
        .bind(email)
        .fetch_one(self.pool)
        .await?;
        Ok(signup)
    }
}
