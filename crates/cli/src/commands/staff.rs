//! Staff account management.

use secrecy::{ExposeSecret, SecretString};

use ojasritu_storefront::services::auth::AuthService;

use super::{CommandError, connect};

/// Create a staff account.
///
/// Staff can manage the catalog, see every order and booking, and update
/// fulfillment and consultation status.
///
/// # Errors
///
/// Returns `CommandError::Auth` if the email is invalid, the password too
/// short, or the account already exists.
pub async fn create(username: &str, email: &str, password: &SecretString) -> Result<(), CommandError> {
    let pool = connect().await?;

    let user = AuthService::new(&pool)
        .create_staff(username, email, password.expose_secret())
        .await?;

    tracing::info!(user_id = %user.id, username = %user.username, "Staff account created");
    Ok(())
}
