//! Catalog route handlers: categories, products and reviews.
//!
//! Reads are public. Creating and editing catalog entries needs a staff
//! account; writing a review needs any signed-in account.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use ojasritu_core::ProductPricing;

use crate::db::reviews::NewReview;
use crate::db::{CatalogRepository, RepositoryError, ReviewRepository};
use crate::error::{AppError, Result};
use crate::middleware::{RequireAuth, RequireStaff};
use crate::models::catalog::{
    Category, NewCategory, NewProduct, Product, ProductDetail, ProductFilter, ProductUpdate,
    ProductView, Review,
};
use crate::state::AppState;

/// Reviews embedded in a product detail response.
const DETAIL_REVIEWS: i64 = 5;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ReviewRequest {
    pub rating: i16,
    pub title: String,
    pub comment: String,
}

async fn product_by_slug(state: &AppState, slug: &str) -> Result<Product> {
    CatalogRepository::new(state.pool())
        .get_product(slug)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))
}

/// Discount rule violations are the caller's fault here.
fn pricing_error(err: RepositoryError) -> AppError {
    match err {
        RepositoryError::DataCorruption(msg) => AppError::BadRequest(msg),
        other => other.into(),
    }
}

// =============================================================================
// Categories
// =============================================================================

/// List all categories.
#[instrument(skip(state))]
pub async fn list_categories(State(state): State<AppState>) -> Result<Json<Vec<Category>>> {
    let categories = CatalogRepository::new(state.pool()).list_categories().await?;
    Ok(Json(categories))
}

/// Show one category.
#[instrument(skip(state))]
pub async fn show_category(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Category>> {
    CatalogRepository::new(state.pool())
        .get_category(&slug)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Category not found".to_string()))
}

/// Create a category (staff).
#[instrument(skip(state, staff, body), fields(staff_id = %staff.id))]
pub async fn create_category(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Json(body): Json<NewCategory>,
) -> Result<(StatusCode, Json<Category>)> {
    if body.name.trim().is_empty() {
        return Err(AppError::BadRequest("name is required".to_string()));
    }

    let category = CatalogRepository::new(state.pool())
        .create_category(&body)
        .await?;
    tracing::info!(slug = %category.slug, "Category created");
    Ok((StatusCode::CREATED, Json(category)))
}

// =============================================================================
// Products
// =============================================================================

/// List active products, optionally filtered.
#[instrument(skip(state))]
pub async fn list_products(
    State(state): State<AppState>,
    Query(filter): Query<ProductFilter>,
) -> Result<Json<Vec<ProductView>>> {
    let products = CatalogRepository::new(state.pool())
        .list_products(&filter)
        .await?;
    Ok(Json(products.into_iter().map(ProductView::from).collect()))
}

/// Product detail with its latest reviews.
#[instrument(skip(state))]
pub async fn show_product(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ProductDetail>> {
    let product = product_by_slug(&state, &slug).await?;
    let reviews = ReviewRepository::new(state.pool())
        .list_for_product(product.id, Some(DETAIL_REVIEWS))
        .await?;

    Ok(Json(ProductDetail {
        product: ProductView::from(product),
        reviews,
    }))
}

/// Create a product (staff).
#[instrument(skip(state, staff, body), fields(staff_id = %staff.id))]
pub async fn create_product(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Json(body): Json<NewProduct>,
) -> Result<(StatusCode, Json<ProductView>)> {
    if body.name.trim().is_empty() {
        return Err(AppError::BadRequest("name is required".to_string()));
    }
    ProductPricing::new(body.price, body.discount_price)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let product = CatalogRepository::new(state.pool())
        .create_product(&body)
        .await
        .map_err(pricing_error)?;
    tracing::info!(slug = %product.slug, sku = %product.sku, "Product created");
    Ok((StatusCode::CREATED, Json(ProductView::from(product))))
}

/// Partially update a product (staff).
#[instrument(skip(state, staff, body), fields(staff_id = %staff.id))]
pub async fn update_product(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Path(slug): Path<String>,
    Json(body): Json<ProductUpdate>,
) -> Result<Json<ProductView>> {
    let product = CatalogRepository::new(state.pool())
        .update_product(&slug, body)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound("Product not found".to_string()),
            other => pricing_error(other),
        })?;
    Ok(Json(ProductView::from(product)))
}

// =============================================================================
// Reviews
// =============================================================================

/// All reviews for a product, newest first.
#[instrument(skip(state))]
pub async fn list_reviews(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Vec<Review>>> {
    let product = product_by_slug(&state, &slug).await?;
    let reviews = ReviewRepository::new(state.pool())
        .list_for_product(product.id, None)
        .await?;
    Ok(Json(reviews))
}

/// Review a product. One review per user and product.
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn create_review(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(slug): Path<String>,
    Json(body): Json<ReviewRequest>,
) -> Result<(StatusCode, Json<Review>)> {
    if !(1..=5).contains(&body.rating) {
        return Err(AppError::BadRequest("Rating must be between 1 and 5".to_string()));
    }

    let product = product_by_slug(&state, &slug).await?;
    let review = ReviewRepository::new(state.pool())
        .create(
            product.id,
            user.id,
            &NewReview {
                rating: body.rating,
                title: body.title.trim().to_string(),
                comment: body.comment.trim().to_string(),
            },
        )
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => {
                AppError::BadRequest("You have already reviewed this product".to_string())
            }
            other => other.into(),
        })?;

    Ok((StatusCode::CREATED, Json(review)))
}
