//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Liveness
//! GET  /health/ready                    - Readiness (database)
//!
//! # Auth
//! GET  /api/auth/csrf                   - Issue CSRF token
//! POST /api/auth/signup                 - Create account (rate limited)
//! POST /api/auth/login                  - Password login (rate limited)
//! POST /api/auth/logout                 - Logout (also /api/logout)
//! GET  /api/auth/check                  - Session status
//! GET  /api/auth/profile                - Signed-in identity
//! POST /api/auth/forgot-password        - Email reset link (rate limited)
//! POST /api/auth/reset-password         - Set new password (rate limited)
//! POST /api/auth/google                 - Google ID token login (rate limited)
//! GET  /api/profile                     - Profile
//! PUT  /api/profile                     - Update profile
//!
//! # Catalog
//! GET  /api/categories                  - Category list
//! POST /api/categories                  - Create category (staff)
//! GET  /api/categories/{slug}           - Category detail
//! GET  /api/products                    - Product list with filters
//! POST /api/products                    - Create product (staff)
//! GET  /api/products/{slug}             - Product detail with latest reviews
//! PUT  /api/products/{slug}             - Update product (staff)
//! GET  /api/products/{slug}/reviews     - Reviews
//! POST /api/products/{slug}/reviews     - Write review
//!
//! # Cart and checkout
//! GET    /api/cart                      - Cart
//! POST   /api/cart/add                  - Add item
//! DELETE /api/cart/remove/{item_id}     - Remove item
//! POST   /api/cashfree/create           - Gateway order (also /api/prebook, /api/prebook/cart)
//! POST   /api/cashfree/webhook          - Gateway notification (signed)
//! GET    /api/orders                    - Orders
//! POST   /api/orders                    - Cash-on-delivery order
//! GET    /api/orders/{order_id}         - Order detail
//! PATCH  /api/orders/{order_id}/status  - Fulfillment status (staff)
//!
//! # Consultations
//! GET   /api/rebookings                 - Bookings
//! POST  /api/rebookings                 - Request booking
//! GET   /api/rebookings/{id}            - Booking detail
//! POST  /api/rebookings/{id}/cancel     - Cancel (owner)
//! POST  /api/rebookings/{id}/reschedule - Reschedule (owner)
//! PATCH /api/rebookings/{id}/status     - Status and notes (staff)
//! PUT   /api/rebookings/{id}/recommendations - Recommended products (staff)
//!
//! # Content and support
//! GET  /api/articles, /api/articles/{slug}
//! GET  /api/blog, /api/blog/{slug}
//! GET  /api/faqs, /api/faqs/by_category?category=
//! GET  /api/contact                     - Own messages (staff: all)
//! POST /api/contact                     - Leave a message
//! POST /api/ojas-gurukul/notify         - Notify-me signup
//! POST /api/chatbot                     - Chat
//! POST /api/chatbot/dosha-analyzer      - Dosha questionnaire
//! GET  /api/chatbot/tips                - Ayurveda tips
//! ```

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod chatbot;
pub mod checkout;
pub mod content;
pub mod health;
pub mod orders;
pub mod profile;
pub mod rebookings;
pub mod support;

use axum::{
    Router,
    routing::{delete, get, patch, post, put},
};

use ojasritu_core::UserId;

use crate::db::UserRepository;
use crate::error::{AppError, Result};
use crate::middleware::credentials_rate_limiter;
use crate::models::User;
use crate::state::AppState;

/// Load the full account behind an authenticated request.
///
/// An account deleted after sign-in counts as signed out.
pub(crate) async fn load_user(state: &AppState, id: UserId) -> Result<User> {
    UserRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .filter(|user| user.is_active)
        .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
}

/// Create the auth routes router.
///
/// Endpoints that accept credentials share a per-IP rate limit.
pub fn auth_routes() -> Router<AppState> {
    let credentials = Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/forgot-password", post(auth::forgot_password))
        .route("/reset-password", post(auth::reset_password))
        .route("/google", post(auth::google))
        .layer(credentials_rate_limiter());

    Router::new()
        .route("/csrf", get(auth::csrf))
        .route("/logout", post(auth::logout))
        .route("/check", get(auth::check))
        .route("/profile", get(auth::profile))
        .merge(credentials)
}

/// Create the catalog routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/categories",
            get(catalog::list_categories).post(catalog::create_category),
        )
        .route("/categories/{slug}", get(catalog::show_category))
        .route(
            "/products",
            get(catalog::list_products).post(catalog::create_product),
        )
        .route(
            "/products/{slug}",
            get(catalog::show_product).put(catalog::update_product),
        )
        .route(
            "/products/{slug}/reviews",
            get(catalog::list_reviews).post(catalog::create_review),
        )
}

/// Create the cart, checkout and order routes router.
pub fn commerce_routes() -> Router<AppState> {
    Router::new()
        .route("/cart", get(cart::show))
        .route("/cart/add", post(cart::add))
        .route("/cart/remove/{item_id}", delete(cart::remove))
        .route("/cashfree/create", post(checkout::create))
        .route("/cashfree/webhook", post(checkout::webhook))
        .route("/prebook", post(checkout::create))
        .route("/prebook/cart", post(checkout::create))
        .route("/orders", get(orders::index).post(orders::create))
        .route("/orders/{order_id}", get(orders::show))
        .route("/orders/{order_id}/status", patch(orders::update_status))
}

/// Create the consultation booking routes router.
pub fn rebooking_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/rebookings",
            get(rebookings::index).post(rebookings::create),
        )
        .route("/rebookings/{id}", get(rebookings::show))
        .route("/rebookings/{id}/cancel", post(rebookings::cancel))
        .route("/rebookings/{id}/reschedule", post(rebookings::reschedule))
        .route("/rebookings/{id}/status", patch(rebookings::update_status))
        .route(
            "/rebookings/{id}/recommendations",
            put(rebookings::set_recommendations),
        )
}

/// Create the content, support and chatbot routes router.
pub fn content_routes() -> Router<AppState> {
    Router::new()
        .route("/articles", get(content::list_articles))
        .route("/articles/{slug}", get(content::show_article))
        .route("/blog", get(content::list_blog_posts))
        .route("/blog/{slug}", get(content::show_blog_post))
        .route("/faqs", get(content::list_faqs))
        .route("/faqs/by_category", get(content::faqs_by_category))
        .route(
            "/contact",
            get(support::list_contacts).post(support::create_contact),
        )
        .route("/ojas-gurukul/notify", post(support::gurukul_notify))
        .route("/chatbot", post(chatbot::chat))
        .route("/chatbot/dosha-analyzer", post(chatbot::dosha_analyzer))
        .route("/chatbot/tips", get(chatbot::ayurveda_tips))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    let api = Router::new()
        .nest("/auth", auth_routes())
        .route("/logout", post(auth::logout))
        .route("/profile", get(profile::show).put(profile::update))
        .merge(catalog_routes())
        .merge(commerce_routes())
        .merge(rebooking_routes())
        .merge(content_routes());

    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api", api)
}
