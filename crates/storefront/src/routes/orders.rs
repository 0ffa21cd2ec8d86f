//! Order route handlers.
//!
//! Customers see their own orders, staff see every order. Another user's
//! order is reported as missing.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;

use crate::db::{OrderRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::middleware::{RequireAuth, RequireStaff};
use crate::models::order::{Order, OrderStatusUpdate, PlaceOrderRequest};
use crate::routes::load_user;
use crate::services::checkout::CheckoutService;
use crate::state::AppState;

fn order_not_found() -> AppError {
    AppError::NotFound("Order not found".to_string())
}

/// List orders, newest first.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<Order>>> {
    let owner = (!user.is_staff).then_some(user.id);
    let orders = OrderRepository::new(state.pool()).list(owner).await?;
    Ok(Json(orders))
}

/// Place a cash-on-delivery order from the cart.
#[instrument(skip(state, current, body), fields(user_id = %current.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Json(body): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<Order>)> {
    let user = load_user(&state, current.id).await?;
    let order = CheckoutService::new(state.pool())
        .place_cod_order(&user, &body)
        .await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// Show one order by its public reference.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(order_id): Path<String>,
) -> Result<Json<Order>> {
    let owner = (!user.is_staff).then_some(user.id);
    OrderRepository::new(state.pool())
        .get_by_reference(&order_id, owner)
        .await?
        .map(Json)
        .ok_or_else(order_not_found)
}

/// Move an order through fulfillment (staff).
///
/// Payment status is not touched here.
#[instrument(skip(state, staff, body), fields(staff_id = %staff.id))]
pub async fn update_status(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Path(order_id): Path<String>,
    Json(body): Json<OrderStatusUpdate>,
) -> Result<Json<Order>> {
    let order = OrderRepository::new(state.pool())
        .update_status(&order_id, &body)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => order_not_found(),
            other => other.into(),
        })?;

    tracing::info!(order_id = %order.order_id, status = %order.status, "Order status updated");
    Ok(Json(order))
}
