//! HTTP middleware stack for the storefront API.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, capture errors)
//! 2. Request ID
//! 3. `TraceLayer` (request tracing)
//! 4. CORS (front end origin, with credentials)
//! 5. Allowed hosts
//! 6. Security headers
//! 7. Session layer (tower-sessions with `PostgreSQL` store)
//! 8. CSRF guard
//! 9. Rate limiting on credential routes (governor)

pub mod allowed_hosts;
pub mod auth;
pub mod csrf;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use allowed_hosts::allowed_hosts_middleware;
pub use auth::{OptionalAuth, RequireAuth, RequireStaff, clear_current_user, set_current_user};
pub use csrf::{csrf_middleware, issue_csrf_token};
pub use rate_limit::credentials_rate_limiter;
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::{create_session_layer, session_layer};
