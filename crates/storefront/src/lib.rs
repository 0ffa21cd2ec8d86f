//! Ojasritu storefront library.
//!
//! This crate provides the storefront API as a library, allowing it to be
//! tested in-process and reused by the operator CLI.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::{
    Router,
    http::{HeaderName, HeaderValue, Method, header},
    middleware::{from_fn, from_fn_with_state},
};
use tower::Layer;
use tower_http::{
    cors::CorsLayer,
    normalize_path::{NormalizePath, NormalizePathLayer},
    trace::TraceLayer,
};
use tower_sessions::{SessionManagerLayer, SessionStore};

use crate::config::StorefrontConfig;
use crate::middleware::csrf::CSRF_HEADER;
use crate::state::AppState;

/// CORS for the single-page front end. Cookies are allowed, so the origin
/// must be explicit.
fn cors_layer(config: &StorefrontConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static(CSRF_HEADER),
        ]);

    match HeaderValue::from_str(config.frontend_url.trim_end_matches('/')) {
        Ok(origin) => cors.allow_origin(origin),
        Err(e) => {
            tracing::warn!(error = %e, "FRONTEND_URL is not a valid origin, CORS disabled");
            cors
        }
    }
}

/// Build the application router with the full middleware stack.
///
/// See [`middleware`] for the layer order.
pub fn app<S>(state: AppState, session_layer: SessionManagerLayer<S>) -> Router
where
    S: SessionStore + Clone,
{
    let cors = cors_layer(state.config());

    routes::routes()
        .layer(from_fn(middleware::csrf_middleware))
        .layer(session_layer)
        .layer(from_fn(middleware::security_headers_middleware))
        .layer(from_fn_with_state(
            state.clone(),
            middleware::allowed_hosts_middleware,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(from_fn(middleware::request_id_middleware))
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// Wrap the router so a trailing slash routes like its absence.
///
/// Path normalization must run before routing, so it wraps the router
/// instead of being one of its layers.
#[must_use]
pub fn with_trailing_slash_tolerance(app: Router) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(app)
}
