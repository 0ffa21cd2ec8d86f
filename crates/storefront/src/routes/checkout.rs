//! Payment gateway route handlers.
//!
//! `POST /api/cashfree/create` (and its prebook aliases) turns the cart into
//! a pending order and a gateway payment session. The gateway reports the
//! outcome to `POST /api/cashfree/webhook`, which is signed rather than
//! authenticated.

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::HeaderMap,
};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::routes::load_user;
use crate::services::checkout::{
    CheckoutError, CheckoutService, PaymentNotification, WebhookOutcome,
};
use crate::services::payments::PaymentError;
use crate::state::AppState;

/// Header carrying the webhook signature.
pub const SIGNATURE_HEADER: &str = "x-cashfree-signature";

#[derive(Debug, Serialize)]
pub struct CreatePaymentResponse {
    pub success: bool,
    pub order_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub payment_session_id: String,
    pub payment_redirect_url: Option<String>,
}

/// Create a pending order from the cart and open a gateway payment session.
#[instrument(skip(state, current), fields(user_id = %current.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<Json<CreatePaymentResponse>> {
    let user = load_user(&state, current.id).await?;

    let payment = CheckoutService::new(state.pool())
        .initiate(state.gateway(), &user, &state.checkout_urls())
        .await?;

    Ok(Json(CreatePaymentResponse {
        success: true,
        order_id: payment.order_id,
        amount: payment.amount,
        payment_session_id: payment.payment_session_id,
        payment_redirect_url: payment.payment_redirect_url,
    }))
}

/// Reconcile a payment notification.
///
/// The signature is checked over the raw body before anything is parsed.
/// Replays and stale notifications are acknowledged without changes.
#[instrument(skip(state, headers, body))]
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>> {
    let gateway = state.gateway().ok_or(PaymentError::NotConfigured)?;

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if signature.is_empty() || !gateway.verify_webhook(&body, signature) {
        tracing::warn!("Rejected webhook with missing or invalid signature");
        return Err(AppError::Forbidden("Invalid signature".to_string()));
    }

    let payload: Value = serde_json::from_slice(&body)
        .map_err(|_| AppError::BadRequest("Invalid JSON payload".to_string()))?;
    let notification = PaymentNotification::from_json(&payload).ok_or_else(|| {
        AppError::BadRequest("order_id and payment_status are required".to_string())
    })?;

    match CheckoutService::new(state.pool())
        .apply_notification(&notification)
        .await
    {
        Ok(WebhookOutcome::Unchanged) => {
            tracing::debug!(order_id = %notification.order_id, "Webhook replay, nothing to do");
        }
        Ok(WebhookOutcome::Applied { .. } | WebhookOutcome::Ignored(_)) => {}
        Err(CheckoutError::Contention(order_id)) => {
            tracing::warn!(order_id = %order_id, "Webhook gave up after repeated conflicts");
        }
        Err(e) => return Err(e.into()),
    }

    Ok(Json(json!({ "success": true })))
}
