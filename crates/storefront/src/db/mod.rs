//! Database operations for the storefront `PostgreSQL` schema.
//!
//! # Schema: `shop`
//!
//! - `users`, `profiles`, `auth_tokens` - Accounts and durable API tokens
//! - `categories`, `products`, `product_reviews` - Catalog
//! - `carts`, `cart_items` - One cart per user
//! - `orders` - Local orders mirrored to the payment gateway
//! - `rebookings`, `rebooking_products` - Consultation bookings
//! - `articles`, `blog_posts`, `faqs` - Content
//! - `contact_messages`, `gurukul_signups` - Support
//!
//! Sessions live in `tower_sessions.session`.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p ojasritu-cli -- migrate
//! ```

pub mod cart;
pub mod catalog;
pub mod content;
pub mod orders;
pub mod profiles;
pub mod rebookings;
pub mod reviews;
pub mod support;
pub mod tokens;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use cart::CartRepository;
pub use catalog::CatalogRepository;
pub use content::ContentRepository;
pub use orders::OrderRepository;
pub use profiles::ProfileRepository;
pub use rebookings::RebookingRepository;
pub use reviews::ReviewRepository;
pub use support::SupportRepository;
pub use tokens::TokenRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique username).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map unique violations to `Conflict`, everything else to `Database`.
    pub(crate) fn from_unique(err: sqlx::Error, what: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.is_unique_violation()
        {
            return Self::Conflict(format!("{what} already exists"));
        }
        Self::Database(err)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
