//! Database migration command.
//!
//! ```bash
//! ojas-cli migrate
//! ```
//!
//! Migrations live in `crates/storefront/migrations` and are embedded at
//! compile time.

use super::{CommandError, connect};

/// Run the storefront migrations.
///
/// # Errors
///
/// Returns `CommandError` if the database is unreachable or a migration fails.
pub async fn storefront() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Running storefront migrations...");
    sqlx::migrate!("../storefront/migrations").run(&pool).await?;

    tracing::info!("Storefront migrations complete!");
    Ok(())
}
