//! Order maintenance commands.

use chrono::{Duration, Utc};

use ojasritu_storefront::services::checkout::CheckoutService;

use super::{CommandError, connect};

/// Void gateway orders that were created but never got a payment session.
///
/// Safe to run from cron: orders that changed meanwhile are skipped.
///
/// # Errors
///
/// Returns `CommandError` if the database is unreachable.
pub async fn sweep(older_than_minutes: u32) -> Result<(), CommandError> {
    let pool = connect().await?;
    let cutoff = Utc::now() - Duration::minutes(i64::from(older_than_minutes));

    let report = CheckoutService::new(&pool).sweep_stale(cutoff).await?;

    tracing::info!(
        examined = report.examined,
        voided = report.voided,
        %cutoff,
        "Stale order sweep finished"
    );
    Ok(())
}
