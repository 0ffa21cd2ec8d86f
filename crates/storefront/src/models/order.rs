//! Order types.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

use ojasritu_core::{OrderAmounts, OrderId, OrderStatus, PaymentMethod, PaymentStatus, PricedLine, UserId};

/// A stored order.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Order {
    pub id: OrderId,
    pub order_id: String,
    #[sqlx(rename = "user_id")]
    pub user: Option<UserId>,
    pub shipping_address: String,
    pub billing_address: String,
    pub phone_number: String,
    pub total_amount: Decimal,
    pub discount_amount: Decimal,
    pub tax_amount: Decimal,
    pub final_amount: Decimal,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub transaction_id: Option<String>,
    pub gateway_order_id: Option<String>,
    #[serde(skip)]
    pub gateway_session_id: Option<String>,
    #[serde(rename = "items")]
    pub cart_snapshot: Json<Vec<PricedLine>>,
    pub special_instructions: String,
    #[serde(skip)]
    pub admin_notes: String,
    pub tracking_number: Option<String>,
    pub estimated_delivery: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Everything needed to insert an order row.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_id: String,
    pub user: UserId,
    pub shipping_address: String,
    pub billing_address: String,
    pub phone_number: String,
    pub amounts: OrderAmounts,
    pub payment_method: PaymentMethod,
    pub gateway_order_id: Option<String>,
    pub lines: Vec<PricedLine>,
    pub special_instructions: String,
}

/// Body of `POST /api/orders` (cash on delivery).
#[derive(Debug, Clone, Deserialize)]
pub struct PlaceOrderRequest {
    pub shipping_address: String,
    pub billing_address: Option<String>,
    pub phone_number: String,
    #[serde(default)]
    pub special_instructions: String,
}

/// Body of `PATCH /api/orders/{order_id}/status`.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderStatusUpdate {
    pub status: OrderStatus,
    pub tracking_number: Option<String>,
    pub estimated_delivery: Option<NaiveDate>,
    pub admin_notes: Option<String>,
}
