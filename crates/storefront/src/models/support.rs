//! Contact messages and the Gurukul notify-me list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ojasritu_core::{ContactCategory, ContactMessageId, GurukulSignupId};

/// A message sent through the contact form.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ContactMessage {
    pub id: ContactMessageId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub subject: String,
    pub message: String,
    pub category: ContactCategory,
    pub is_resolved: bool,
    pub admin_response: String,
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /api/contact`.
#[derive(Debug, Clone, Deserialize)]
pub struct NewContactMessage {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub category: ContactCategory,
}

/// Body of `POST /api/ojas-gurukul/notify`.
#[derive(Debug, Clone, Deserialize)]
pub struct GurukulNotifyRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

/// Result of the notify-me upsert.
#[derive(Debug, Clone, Copy, sqlx::FromRow)]
pub struct GurukulSignup {
    pub id: GurukulSignupId,
    /// `false` when the email was already on the list.
    pub created: bool,
}
