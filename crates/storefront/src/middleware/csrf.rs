//! CSRF protection for cookie-authenticated requests.
//!
//! `GET /api/auth/csrf` stores a random token in the session and returns it.
//! Unsafe methods must echo it in the `X-CSRFToken` header. The payment
//! webhook and requests carrying an API token are exempt since neither
//! relies on the session cookie.

use axum::{
    Json,
    extract::Request,
    http::{Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tower_sessions::Session;

use crate::middleware::auth::api_token;
use crate::models::session_keys;

/// Header clients echo the token in.
pub const CSRF_HEADER: &str = "x-csrftoken";

/// Paths that never need a CSRF token.
const EXEMPT_PATHS: &[&str] = &["/api/cashfree/webhook"];

/// Return the session's CSRF token, minting one if needed.
///
/// # Errors
///
/// Returns an error if the session cannot be read or written.
pub async fn issue_csrf_token(session: &Session) -> Result<String, tower_sessions::session::Error> {
    if let Some(token) = session.get::<String>(session_keys::CSRF_TOKEN).await? {
        return Ok(token);
    }
    let token = hex::encode(rand::random::<[u8; 32]>());
    session.insert(session_keys::CSRF_TOKEN, &token).await?;
    Ok(token)
}

fn is_unsafe(method: &Method) -> bool {
    !matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE)
}

fn is_exempt(request: &Request) -> bool {
    let path = request.uri().path().trim_end_matches('/');
    if EXEMPT_PATHS.contains(&path) {
        return true;
    }
    api_token(request.headers()).is_some()
}

/// Byte comparison whose time does not depend on where inputs differ.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

fn forbidden() -> Response {
    (
        StatusCode::FORBIDDEN,
        Json(json!({ "error": "CSRF token missing or incorrect" })),
    )
        .into_response()
}

/// Reject unsafe requests whose `X-CSRFToken` does not match the session.
///
/// Must run inside the session layer.
pub async fn csrf_middleware(request: Request, next: Next) -> Response {
    if !is_unsafe(request.method()) || is_exempt(&request) {
        return next.run(request).await;
    }

    let Some(presented) = request
        .headers()
        .get(CSRF_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
    else {
        tracing::debug!(path = %request.uri().path(), "CSRF header missing");
        return forbidden();
    };

    let expected = match request.extensions().get::<Session>() {
        Some(session) => session
            .get::<String>(session_keys::CSRF_TOKEN)
            .await
            .ok()
            .flatten(),
        None => None,
    };

    match expected {
        Some(expected) if constant_time_eq(expected.as_bytes(), presented.as_bytes()) => {
            next.run(request).await
        }
        _ => {
            tracing::debug!(path = %request.uri().path(), "CSRF token mismatch");
            forbidden()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, http::header::AUTHORIZATION, routing::{get, post}};
    use tower::ServiceExt;
    use tower_sessions::{MemoryStore, SessionManagerLayer};

    fn app() -> Router {
        Router::new()
            .route(
                "/api/auth/csrf",
                get(|session: Session| async move { issue_csrf_token(&session).await.unwrap() }),
            )
            .route("/api/cart/add", post(|| async { "added" }))
            .route("/api/cashfree/webhook", post(|| async { "ok" }))
            .layer(axum::middleware::from_fn(csrf_middleware))
            .layer(SessionManagerLayer::new(MemoryStore::default()).with_secure(false))
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
        assert!(constant_time_eq(b"", b""));
    }

    #[tokio::test]
    async fn test_safe_methods_pass() {
        let response = app()
            .oneshot(Request::get("/api/auth/csrf").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unsafe_without_token_rejected() {
        let response = app()
            .oneshot(Request::post("/api/cart/add").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = app()
            .oneshot(
                Request::post("/api/cart/add")
                    .header(CSRF_HEADER, "guess")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_round_trip_with_session_cookie() {
        let app = app();
        let response = app
            .clone()
            .oneshot(Request::get("/api/auth/csrf").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let cookie = response
            .headers()
            .get("set-cookie")
            .unwrap()
            .to_str()
            .unwrap()
            .split(';')
            .next()
            .unwrap()
            .to_string();
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        let token = String::from_utf8(body.to_vec()).unwrap();

        let response = app
            .clone()
            .oneshot(
                Request::post("/api/cart/add")
                    .header("cookie", &cookie)
                    .header(CSRF_HEADER, &token)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(
                Request::post("/api/cart/add")
                    .header("cookie", &cookie)
                    .header(CSRF_HEADER, "0".repeat(64))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_exemptions() {
        let response = app()
            .oneshot(Request::post("/api/cashfree/webhook/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        // Trailing slash is not routed here, but the guard must not reject it
        assert_ne!(response.status(), StatusCode::FORBIDDEN);

        let response = app()
            .oneshot(
                Request::post("/api/cart/add")
                    .header(AUTHORIZATION, "Token abc")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_empty_api_token_is_not_exempt() {
        for value in ["Token ", "Token    "] {
            let response = app()
                .oneshot(
                    Request::post("/api/cart/add")
                        .header(AUTHORIZATION, value)
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::FORBIDDEN, "{value:?}");
        }
    }
}
