//! Checkout: cart snapshot to local order to gateway order, and webhook
//! reconciliation back onto the local order.
//!
//! Payment status changes always go through [`ojasritu_core::reconcile`]
//! and are applied with a compare-and-set update, retried a bounded number
//! of times when another writer wins the race.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::PgPool;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use ojasritu_core::{
    OrderAmounts, PaymentMethod, PaymentStatus, Reconciliation, RejectReason,
    cart_total, format_order_reference, normalize_gateway_status, reconcile,
};

use super::payments::{GatewayCustomer, GatewayOrderRequest, PaymentError, PaymentGateway};
use crate::db::orders::PaymentTransition;
use crate::db::{CartRepository, OrderRepository, ProfileRepository, RepositoryError};
use crate::models::User;
use crate::models::order::{NewOrder, Order, PlaceOrderRequest};

/// Maximum compare-and-set attempts per notification.
pub const MAX_CAS_ATTEMPTS: usize = 3;

/// Phone sent to the gateway when the profile has none.
const FALLBACK_PHONE: &str = "9999999999";

/// Prefix of gateway order references.
const ORDER_PREFIX: &str = "CF";

/// Errors from checkout operations.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Cart is empty")]
    EmptyCart,

    #[error("Order not found")]
    OrderNotFound,

    #[error("{0}")]
    Validation(String),

    #[error("payment gateway: {0}")]
    Payment(#[from] PaymentError),

    #[error("order {0} kept changing during reconciliation")]
    Contention(String),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// URLs handed to the gateway.
#[derive(Debug, Clone)]
pub struct CheckoutUrls {
    /// Front end origin, without a trailing slash.
    pub frontend_url: String,
    /// Public origin of this API, without a trailing slash.
    pub base_url: String,
}

impl CheckoutUrls {
    #[must_use]
    pub fn return_url(&self, order_id: &str) -> String {
        format!("{}/checkout/success?order_id={order_id}", self.frontend_url)
    }

    #[must_use]
    pub fn notify_url(&self) -> String {
        format!("{}/api/cashfree/webhook", self.base_url)
    }
}

/// A gateway order ready for the customer to pay.
#[derive(Debug, Clone)]
pub struct InitiatedPayment {
    pub order_id: String,
    pub amount: Decimal,
    pub payment_session_id: String,
    pub payment_redirect_url: Option<String>,
}

/// A payment notification extracted from a webhook body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentNotification {
    pub order_id: String,
    pub payment_status: String,
    pub transaction_id: Option<String>,
}

impl PaymentNotification {
    /// Read `order_id` and `payment_status` from the top level, falling back
    /// to the gateway's nested `data.order` and `data.payment` objects.
    #[must_use]
    pub fn from_json(body: &Value) -> Option<Self> {
        let order_id = non_empty_str(body.get("order_id"))
            .or_else(|| non_empty_str(body.pointer("/data/order/order_id")))?;
        let payment_status = non_empty_str(body.get("payment_status"))
            .or_else(|| non_empty_str(body.pointer("/data/payment/payment_status")))?;

        let transaction_id = body
            .pointer("/data/payment/cf_payment_id")
            .or_else(|| body.get("cf_payment_id"))
            .and_then(|v| match v {
                Value::String(s) if !s.is_empty() => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            });

        Some(Self {
            order_id,
            payment_status,
            transaction_id,
        })
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// What a notification did to the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    Unchanged,
    Applied {
        from: PaymentStatus,
        to: PaymentStatus,
    },
    Ignored(RejectReason),
}

/// Result of a stale-order sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub examined: usize,
    pub voided: usize,
}

/// Checkout service.
pub struct CheckoutService<'a> {
    carts: CartRepository<'a>,
    orders: OrderRepository<'a>,
    profiles: ProfileRepository<'a>,
}

impl<'a> CheckoutService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            carts: CartRepository::new(pool),
            orders: OrderRepository::new(pool),
            profiles: ProfileRepository::new(pool),
        }
    }

    // =========================================================================
    // Gateway checkout
    // =========================================================================

    /// Snapshot the user's cart into a pending order and create the matching
    /// gateway order.
    ///
    /// The cart is left untouched. When the gateway call fails the order
    /// stays pending without a session and is later voided by the sweep.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` if there is nothing to pay for.
    /// Returns `CheckoutError::Payment` if the gateway is missing or fails.
    #[instrument(skip(self, gateway, user, urls), fields(user_id = %user.id))]
    pub async fn initiate(
        &self,
        gateway: Option<&dyn PaymentGateway>,
        user: &User,
        urls: &CheckoutUrls,
    ) -> Result<InitiatedPayment, CheckoutError> {
        let lines = self.carts.priced_lines(user.id).await?;
        let total = cart_total(&lines);
        if lines.is_empty() || total <= Decimal::ZERO {
            return Err(CheckoutError::EmptyCart);
        }

        let gateway = gateway.ok_or(PaymentError::NotConfigured)?;

        let order_id = format_order_reference(ORDER_PREFIX, &rand::random::<[u8; 8]>());
        let phone = self.profiles.phone(user.id).await?;

        let order = self
            .orders
            .create(&NewOrder {
                order_id: order_id.clone(),
                user: user.id,
                shipping_address: String::new(),
                billing_address: String::new(),
                phone_number: phone.clone(),
                amounts: OrderAmounts::for_subtotal(total),
                payment_method: PaymentMethod::Cashfree,
                gateway_order_id: Some(order_id.clone()),
                lines,
                special_instructions: String::new(),
            })
            .await?;

        let request = GatewayOrderRequest {
            order_id: order_id.clone(),
            amount: total,
            customer: GatewayCustomer {
                id: user.id.to_string(),
                name: user.display_name(),
                email: user.email.clone(),
                phone: if phone.trim().is_empty() {
                    FALLBACK_PHONE.to_string()
                } else {
                    phone
                },
            },
            return_url: urls.return_url(&order_id),
            notify_url: urls.notify_url(),
            note: format!("Ojasritu Wellness Order {order_id}"),
        };

        let created = match gateway.create_order(&request).await {
            Ok(created) => created,
            Err(e) => {
                tracing::error!(order_id = %order_id, error = %e, "Gateway order creation failed");
                return Err(e.into());
            }
        };

        self.orders
            .set_gateway_session(order.id, &created.payment_session_id)
            .await?;

        info!(order_id = %order_id, amount = %total, "Gateway order created");

        Ok(InitiatedPayment {
            order_id,
            amount: total,
            payment_session_id: created.payment_session_id,
            payment_redirect_url: created.payment_redirect_url,
        })
    }

    /// Apply a verified payment notification to its order.
    ///
    /// Replaying the same notification leaves the order unchanged.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::OrderNotFound` for unknown gateway orders.
    /// Returns `CheckoutError::Contention` if every attempt lost a race.
    #[instrument(skip(self, notification), fields(order_id = %notification.order_id))]
    pub async fn apply_notification(
        &self,
        notification: &PaymentNotification,
    ) -> Result<WebhookOutcome, CheckoutError> {
        let reported = normalize_gateway_status(&notification.payment_status);

        let order = self
            .orders
            .find_by_gateway_order_id(&notification.order_id)
            .await?
            .ok_or(CheckoutError::OrderNotFound)?;

        self.transition(order, reported, notification.transaction_id.as_deref())
            .await
    }

    /// Drive an order towards `reported` through the guard with bounded
    /// compare-and-set retries.
    ///
    /// `order` may be stale. A lost write re-reads the row and decides
    /// again against what is stored.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::OrderNotFound` if the order disappears.
    /// Returns `CheckoutError::Contention` if every attempt lost a race.
    pub async fn transition(
        &self,
        mut order: Order,
        reported: PaymentStatus,
        transaction_id: Option<&str>,
    ) -> Result<WebhookOutcome, CheckoutError> {
        for attempt in 1..=MAX_CAS_ATTEMPTS {
            match reconcile(order.payment_status, order.status, reported) {
                Reconciliation::Unchanged => {
                    debug!(status = %reported, "Payment status already applied");
                    return Ok(WebhookOutcome::Unchanged);
                }
                Reconciliation::Rejected(reason) => {
                    warn!(
                        order_id = %order.order_id,
                        current = %order.payment_status,
                        reported = %reported,
                        reason = reason.as_str(),
                        "Ignoring conflicting payment status; needs manual review"
                    );
                    return Ok(WebhookOutcome::Ignored(reason));
                }
                Reconciliation::Apply {
                    from,
                    to,
                    order_status,
                } => {
                    let applied = self
                        .orders
                        .compare_and_set_payment(
                            order.id,
                            PaymentTransition {
                                expected: from,
                                expected_order: order.status,
                                to,
                                order_status,
                                transaction_id,
                            },
                        )
                        .await?;

                    if applied {
                        info!(order_id = %order.order_id, %from, %to, "Payment status updated");
                        return Ok(WebhookOutcome::Applied { from, to });
                    }

                    debug!(attempt, "Order changed concurrently, re-reading");
                    order = self
                        .orders
                        .get(order.id)
                        .await?
                        .ok_or(CheckoutError::OrderNotFound)?;
                }
            }
        }

        Err(CheckoutError::Contention(order.order_id))
    }

    // =========================================================================
    // Cash on delivery
    // =========================================================================

    /// Place a cash-on-delivery order from the cart and empty the cart in
    /// the same transaction.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` if the cart has no lines.
    /// Returns `CheckoutError::Validation` if the address or phone is blank.
    #[instrument(skip(self, user, request), fields(user_id = %user.id))]
    pub async fn place_cod_order(
        &self,
        user: &User,
        request: &PlaceOrderRequest,
    ) -> Result<Order, CheckoutError> {
        let shipping = request.shipping_address.trim();
        let phone = request.phone_number.trim();
        if shipping.is_empty() || phone.is_empty() {
            return Err(CheckoutError::Validation(
                "shipping_address and phone_number are required".to_string(),
            ));
        }

        let lines = self.carts.priced_lines(user.id).await?;
        let total = cart_total(&lines);
        if lines.is_empty() || total <= Decimal::ZERO {
            return Err(CheckoutError::EmptyCart);
        }

        let order_id = format_order_reference("ORD", &rand::random::<[u8; 8]>());
        let billing = request
            .billing_address
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(shipping);

        let order = self
            .orders
            .create_and_clear_cart(&NewOrder {
                order_id,
                user: user.id,
                shipping_address: shipping.to_string(),
                billing_address: billing.to_string(),
                phone_number: phone.to_string(),
                amounts: OrderAmounts::for_subtotal(total),
                payment_method: PaymentMethod::Cod,
                gateway_order_id: None,
                lines,
                special_instructions: request.special_instructions.trim().to_string(),
            })
            .await?;

        info!(order_id = %order.order_id, amount = %total, "Cash-on-delivery order placed");
        Ok(order)
    }

    // =========================================================================
    // Maintenance
    // =========================================================================

    /// Void gateway orders left pending without a payment session since
    /// before `cutoff`.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Repository` if the database operation fails.
    pub async fn sweep_stale(&self, cutoff: DateTime<Utc>) -> Result<SweepReport, CheckoutError> {
        let stale = self.orders.stale_pending(cutoff).await?;
        let mut report = SweepReport {
            examined: stale.len(),
            voided: 0,
        };

        for order in stale {
            let order_id = order.order_id.clone();
            match self.transition(order, PaymentStatus::Failed, None).await {
                Ok(WebhookOutcome::Applied { .. }) => {
                    report.voided += 1;
                    info!(order_id = %order_id, "Voided stale pending order");
                }
                Ok(_) => {}
                Err(CheckoutError::Contention(_)) => {
                    warn!(order_id = %order_id, "Skipped stale order that kept changing");
                }
                Err(e) => return Err(e),
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_notification_from_top_level() {
        let body = json!({"order_id": "CF-0011223344556677", "payment_status": "SUCCESS"});
        let n = PaymentNotification::from_json(&body).unwrap();
        assert_eq!(n.order_id, "CF-0011223344556677");
        assert_eq!(n.payment_status, "SUCCESS");
        assert_eq!(n.transaction_id, None);
    }

    #[test]
    fn test_notification_from_nested_payload() {
        let body = json!({
            "type": "PAYMENT_SUCCESS_WEBHOOK",
            "data": {
                "order": {"order_id": "CF-AABBCCDDEEFF0011", "order_amount": 450.0},
                "payment": {"payment_status": "SUCCESS", "cf_payment_id": 885_017_233}
            }
        });
        let n = PaymentNotification::from_json(&body).unwrap();
        assert_eq!(n.order_id, "CF-AABBCCDDEEFF0011");
        assert_eq!(n.payment_status, "SUCCESS");
        assert_eq!(n.transaction_id.as_deref(), Some("885017233"));
    }

    #[test]
    fn test_notification_requires_both_fields() {
        assert!(PaymentNotification::from_json(&json!({"order_id": "CF-1"})).is_none());
        assert!(PaymentNotification::from_json(&json!({"payment_status": "PAID"})).is_none());
        assert!(
            PaymentNotification::from_json(&json!({"order_id": "", "payment_status": "PAID"}))
                .is_none()
        );
        assert!(PaymentNotification::from_json(&json!([1, 2, 3])).is_none());
    }

    #[test]
    fn test_checkout_urls() {
        let urls = CheckoutUrls {
            frontend_url: "https://ojasritu.co.in".to_string(),
            base_url: "https://api.ojasritu.co.in".to_string(),
        };
        assert_eq!(
            urls.return_url("CF-1"),
            "https://ojasritu.co.in/checkout/success?order_id=CF-1"
        );
        assert_eq!(urls.notify_url(), "https://api.ojasritu.co.in/api/cashfree/webhook");
    }
}
