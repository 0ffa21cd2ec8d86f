//! Payment gateway integration.
//!
//! [`PaymentGateway`] is the seam between checkout and the hosted gateway.
//! [`cashfree::CashfreeGateway`] is the production implementation.

pub mod cashfree;
pub mod signature;

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

pub use cashfree::CashfreeGateway;

/// Errors from the payment gateway.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// Credentials are not configured.
    #[error("Cashfree credentials are not configured")]
    NotConfigured,

    /// The gateway refused the request.
    #[error("{0}")]
    Rejected(String),

    /// The gateway could not be reached or timed out.
    #[error("gateway unreachable: {0}")]
    Unreachable(String),

    /// The gateway answered with something we cannot use.
    #[error("{0}")]
    InvalidResponse(String),
}

/// Customer block sent with a gateway order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayCustomer {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// A gateway order to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayOrderRequest {
    pub order_id: String,
    pub amount: Decimal,
    pub customer: GatewayCustomer,
    pub return_url: String,
    pub notify_url: String,
    pub note: String,
}

/// A created gateway order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayOrder {
    pub payment_session_id: String,
    pub payment_redirect_url: Option<String>,
}

/// A hosted payment gateway.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create an order on the gateway and return its payment session.
    async fn create_order(&self, request: &GatewayOrderRequest) -> Result<GatewayOrder, PaymentError>;

    /// Check a webhook signature over the raw body.
    fn verify_webhook(&self, body: &[u8], signature: &str) -> bool;
}
