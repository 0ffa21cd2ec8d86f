//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use ojasritu_core::{ProfileId, UserId};

/// A storefront account.
///
/// `username` equals the lowercased email for accounts created through
/// signup or Google sign-in. Staff accounts created by the CLI may differ.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// `None` for federated-only accounts.
    pub password_hash: Option<String>,
    pub is_staff: bool,
    pub is_active: bool,
    pub date_joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl User {
    /// Full name, or the username when no name is on file.
    #[must_use]
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

/// Profile joined with the owning user's public fields.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Profile {
    pub id: ProfileId,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub bio: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(first: &str, last: &str) -> User {
        User {
            id: UserId::new(1),
            username: "seeker@ojasritu.co.in".to_string(),
            email: "seeker@ojasritu.co.in".to_string(),
            first_name: first.to_string(),
            last_name: last.to_string(),
            password_hash: None,
            is_staff: false,
            is_active: true,
            date_joined: Utc::now(),
            last_login: None,
        }
    }

    #[test]
    fn test_display_name() {
        assert_eq!(user("Asha", "Verma").display_name(), "Asha Verma");
        assert_eq!(user("Asha", "").display_name(), "Asha");
        assert_eq!(user(" ", "").display_name(), "seeker@ojasritu.co.in");
    }
}
