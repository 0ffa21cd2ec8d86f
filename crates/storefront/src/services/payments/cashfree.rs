//! Cashfree Payment Gateway client.
//!
//! Creates orders through the PG `orders` API and verifies webhook
//! signatures with the merchant secret.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;

use super::signature::verify_signature;
use super::{GatewayOrder, GatewayOrderRequest, PaymentError, PaymentGateway};
use crate::config::CashfreeConfig;

/// Cashfree API version.
const API_VERSION: &str = "2023-08-01";

/// Cashfree gateway client.
#[derive(Clone)]
pub struct CashfreeGateway {
    client: reqwest::Client,
    base_url: String,
    secret_key: SecretString,
}

#[derive(Debug, Serialize)]
struct CreateOrderBody<'a> {
    order_id: &'a str,
    #[serde(with = "rust_decimal::serde::float")]
    order_amount: rust_decimal::Decimal,
    order_currency: &'static str,
    order_note: &'a str,
    customer_details: CustomerDetails<'a>,
    order_meta: OrderMeta<'a>,
}

#[derive(Debug, Serialize)]
struct CustomerDetails<'a> {
    customer_id: &'a str,
    customer_name: &'a str,
    customer_email: &'a str,
    customer_phone: &'a str,
}

#[derive(Debug, Serialize)]
struct OrderMeta<'a> {
    return_url: &'a str,
    notify_url: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreateOrderResponse {
    payment_session_id: Option<String>,
    #[serde(default)]
    payments: Value,
}

impl CashfreeGateway {
    /// Create a new Cashfree client.
    ///
    /// # Errors
    ///
    /// Returns error if the credentials are not valid header values or the
    /// HTTP client fails to build.
    pub fn new(config: &CashfreeConfig) -> Result<Self, PaymentError> {
        let mut headers = HeaderMap::new();

        headers.insert(
            "x-client-id",
            HeaderValue::from_str(&config.app_id)
                .map_err(|e| PaymentError::InvalidResponse(format!("Invalid app id: {e}")))?,
        );
        let mut secret = HeaderValue::from_str(config.secret_key.expose_secret())
            .map_err(|e| PaymentError::InvalidResponse(format!("Invalid secret key: {e}")))?;
        secret.set_sensitive(true);
        headers.insert("x-client-secret", secret);
        headers.insert("x-api-version", HeaderValue::from_static(API_VERSION));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(8))
            .build()
            .map_err(|e| PaymentError::Unreachable(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.environment.base_url().to_string(),
            secret_key: config.secret_key.clone(),
        })
    }

    /// Point the client at another base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl PaymentGateway for CashfreeGateway {
    #[instrument(skip(self, request), fields(order_id = %request.order_id))]
    async fn create_order(&self, request: &GatewayOrderRequest) -> Result<GatewayOrder, PaymentError> {
        let body = CreateOrderBody {
            order_id: &request.order_id,
            order_amount: request.amount,
            order_currency: "INR",
            order_note: &request.note,
            customer_details: CustomerDetails {
                customer_id: &request.customer.id,
                customer_name: &request.customer.name,
                customer_email: &request.customer.email,
                customer_phone: &request.customer.phone,
            },
            order_meta: OrderMeta {
                return_url: &request.return_url,
                notify_url: &request.notify_url,
            },
        };

        let response = self
            .client
            .post(format!("{}/orders", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| PaymentError::Unreachable(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| PaymentError::Unreachable(e.to_string()))?;

        if status.is_server_error() {
            return Err(PaymentError::Unreachable(format!("gateway returned {status}")));
        }
        if !status.is_success() {
            return Err(PaymentError::Rejected(error_message(&text)));
        }

        let parsed: CreateOrderResponse = serde_json::from_str(&text)
            .map_err(|e| PaymentError::InvalidResponse(e.to_string()))?;

        let payment_session_id = parsed
            .payment_session_id
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                PaymentError::InvalidResponse(
                    "Cashfree did not return a payment_session_id".to_string(),
                )
            })?;

        let payment_redirect_url = parsed
            .payments
            .get("1")
            .and_then(|p| p.get("url"))
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(GatewayOrder {
            payment_session_id,
            payment_redirect_url,
        })
    }

    fn verify_webhook(&self, body: &[u8], signature: &str) -> bool {
        verify_signature(self.secret_key.expose_secret().as_bytes(), body, signature)
    }
}

/// The gateway's `message` field, or the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}
