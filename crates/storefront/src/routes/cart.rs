//! Cart route handlers.
//!
//! Every cart belongs to a signed-in user and is created on the first add.
//! Totals are recomputed from current prices on every response.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use ojasritu_core::{CartItemId, ProductId};

use crate::db::{CartRepository, CatalogRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::cart::{CartSummary, CartView};
use crate::state::AppState;

/// Largest quantity accepted in a single add.
const MAX_QUANTITY: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: Option<ProductId>,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
}

const fn default_quantity() -> i64 {
    1
}

fn mutation_response(message: String, summary: CartSummary) -> Json<Value> {
    Json(json!({
        "success": true,
        "message": message,
        "cart_total": summary.total,
        "cart_items_count": summary.items_count,
    }))
}

/// Add a product to the cart, incrementing an existing line.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<AddToCartRequest>,
) -> Result<Json<Value>> {
    let product_id = body
        .product_id
        .ok_or_else(|| AppError::BadRequest("product_id is required".to_string()))?;

    if !(1..=MAX_QUANTITY).contains(&body.quantity) {
        return Err(AppError::BadRequest(format!(
            "Quantity must be between 1 and {MAX_QUANTITY}"
        )));
    }
    let quantity = i32::try_from(body.quantity)
        .map_err(|_| AppError::BadRequest("Invalid quantity".to_string()))?;

    let product = CatalogRepository::new(state.pool())
        .get_active_product(product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found or inactive".to_string()))?;

    let summary = CartRepository::new(state.pool())
        .add_item(user.id, product.id, quantity)
        .await?;

    Ok(mutation_response(
        format!("{} added to cart", product.name),
        summary,
    ))
}

/// Show the cart with line and grand totals.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Value>> {
    let carts = CartRepository::new(state.pool());

    let Some(cart_id) = carts.cart_id(user.id).await? else {
        return Ok(Json(json!({
            "items": [],
            "total_price": "0",
            "message": "Cart is empty",
        })));
    };

    let view = CartView::new(cart_id, carts.lines(cart_id).await?);
    Ok(Json(json!(view)))
}

/// Remove a line from the caller's cart.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(item_id): Path<CartItemId>,
) -> Result<Json<Value>> {
    let (name, summary) = CartRepository::new(state.pool())
        .remove_item(user.id, item_id)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound("Item not found in cart".to_string()),
            other => other.into(),
        })?;

    Ok(mutation_response(format!("{name} removed from cart"), summary))
}
