//! API behavior that needs no database.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::json;

use ojasritu_integration_tests::{TestApp, sign};

// =============================================================================
// Health and middleware
// =============================================================================

#[tokio::test]
async fn test_health() {
    let app = TestApp::offline();
    let response = app.get("/health").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
}

#[tokio::test]
async fn test_trailing_slash_routes_like_bare_path() {
    let app = TestApp::offline();
    assert_eq!(app.get("/health/").await.status, StatusCode::OK);
    assert_eq!(app.get("/api/chatbot/tips/").await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_security_headers_and_request_id() {
    let app = TestApp::offline();
    let response = app.get("/health").await;
    assert_eq!(response.headers["x-content-type-options"], "nosniff");
    assert_eq!(response.headers["x-frame-options"], "DENY");
    assert!(response.headers.contains_key("x-request-id"));
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let app = TestApp::offline();
    assert_eq!(app.get("/api/nope").await.status, StatusCode::NOT_FOUND);
}

// =============================================================================
// CSRF
// =============================================================================

#[tokio::test]
async fn test_csrf_issues_token_and_cookie() {
    let app = TestApp::offline();
    let response = app.get("/api/auth/csrf").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["csrftoken"].as_str().unwrap().len(), 64);
    assert!(response.session_cookie().is_some());
}

#[tokio::test]
async fn test_unsafe_request_without_csrf_token_is_rejected() {
    let app = TestApp::offline();
    let response = app.post("/api/chatbot", &json!({"message": "hello"})).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.body["error"], "CSRF token missing or incorrect");
}

#[tokio::test]
async fn test_csrf_token_from_another_session_is_rejected() {
    let first = TestApp::offline();
    first.start_session().await;

    let second = TestApp::offline();
    second.start_session().await;
    second.use_csrf_token(first.csrf_token().unwrap());
    let response = second.post("/api/chatbot", &json!({"message": "hello"})).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

// =============================================================================
// Authentication required
// =============================================================================

#[tokio::test]
async fn test_protected_routes_require_sign_in() {
    let app = TestApp::offline();
    app.start_session().await;

    for uri in ["/api/orders", "/api/profile", "/api/auth/profile", "/api/rebookings"] {
        let response = app.get(uri).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(response.body["error"], "Authentication required");
    }

    let response = app.post("/api/cart/add", &json!({"product_id": 1})).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_check_reports_anonymous_session() {
    let app = TestApp::offline();
    let response = app.get("/api/auth/check").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["authenticated"], false);
}

#[tokio::test]
async fn test_google_login_requires_token() {
    let app = TestApp::offline_with_fakes();
    app.start_session().await;

    let response = app.post("/api/auth/google", &json!({})).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "id_token required");
}

#[tokio::test]
async fn test_google_login_rejects_invalid_token() {
    let app = TestApp::offline_with_fakes();
    app.start_session().await;

    let response = app
        .post("/api/auth/google", &json!({"credential": "forged"}))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "Invalid or expired token");
}

#[tokio::test]
async fn test_google_login_without_client_id_is_server_error() {
    let app = TestApp::offline();
    app.start_session().await;

    let response = app
        .post("/api/auth/google", &json!({"id_token": "anything"}))
        .await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
}

// =============================================================================
// Payment webhook
// =============================================================================

#[tokio::test]
async fn test_webhook_without_gateway_is_server_error() {
    let app = TestApp::offline();
    let body = r#"{"order_id":"CF-0011223344556677","payment_status":"SUCCESS"}"#;
    let response = app.webhook(body, Some(&sign(body.as_bytes()))).await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_webhook_rejects_missing_signature() {
    let app = TestApp::offline_with_fakes();
    let body = r#"{"order_id":"CF-0011223344556677","payment_status":"SUCCESS"}"#;
    let response = app.webhook(body, None).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.body["error"], "Invalid signature");
}

#[tokio::test]
async fn test_webhook_rejects_tampered_body() {
    let app = TestApp::offline_with_fakes();
    let signed = r#"{"order_id":"CF-0011223344556677","payment_status":"FAILED"}"#;
    let sent = r#"{"order_id":"CF-0011223344556677","payment_status":"SUCCESS"}"#;
    let response = app.webhook(sent, Some(&sign(signed.as_bytes()))).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_webhook_rejects_invalid_json() {
    let app = TestApp::offline_with_fakes();
    let body = "order_id=CF-1";
    let response = app.webhook(body, Some(&sign(body.as_bytes()))).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "Invalid JSON payload");
}

#[tokio::test]
async fn test_webhook_requires_order_and_status() {
    let app = TestApp::offline_with_fakes();
    let body = r#"{"type":"PAYMENT_SUCCESS_WEBHOOK","data":{"order":{}}}"#;
    let response = app.webhook(body, Some(&sign(body.as_bytes()))).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Chatbot
// =============================================================================

#[tokio::test]
async fn test_chatbot_falls_back_without_model() {
    let app = TestApp::offline();
    app.start_session().await;

    let response = app
        .post("/api/chatbot", &json!({"message": "What should I eat for better digestion?"}))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "success");
    assert_eq!(response.body["source"], "fallback");
    assert_eq!(response.body["language"], "en");
    assert!(!response.body["message"].as_str().unwrap().is_empty());
    assert!(!response.body["slok"].as_str().unwrap().is_empty());
    assert!(response.body.get("model").is_none());
}

#[tokio::test]
async fn test_chatbot_answers_in_hindi() {
    let app = TestApp::offline();
    app.start_session().await;

    let response = app
        .post("/api/chatbot", &json!({"message": "namaste", "language": "hi"}))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["language"], "hi");
}

#[tokio::test]
async fn test_chatbot_rejects_blank_message() {
    let app = TestApp::offline();
    app.start_session().await;

    let response = app.post("/api/chatbot", &json!({"message": "   "})).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "Message is required");
}

#[tokio::test]
async fn test_dosha_analyzer_scores_answers() {
    let app = TestApp::offline();
    app.start_session().await;

    let response = app
        .post(
            "/api/chatbot/dosha-analyzer",
            &json!({"answers": {"body_frame": 3, "skin_type": 3, "appetite": 2, "energy_level": 2}}),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let result = &response.body["result"];
    assert_eq!(result["scores"]["vata"], 60);
    assert_eq!(result["scores"]["pitta"], 20);
    assert_eq!(result["scores"]["kapha"], 20);
    assert_eq!(result["primary_dosha"], "vata");
    assert_eq!(result["recommendations"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_dosha_analyzer_requires_answers() {
    let app = TestApp::offline();
    app.start_session().await;

    let response = app
        .post("/api/chatbot/dosha-analyzer", &json!({"answers": {}}))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_tips_filter_by_type() {
    let app = TestApp::offline();

    let all = app.get("/api/chatbot/tips").await;
    assert_eq!(all.status, StatusCode::OK);
    assert_eq!(all.body["count"], 3);

    let dosha = app.get("/api/chatbot/tips?type=dosha&language=hi").await;
    assert_eq!(dosha.body["count"], 1);
    assert_eq!(dosha.body["tips"][0]["title"], "तीनों दोषों को समझें");
}

// =============================================================================
// Input validation before the database
// =============================================================================

#[tokio::test]
async fn test_faqs_by_category_requires_category() {
    let app = TestApp::offline();
    let response = app.get("/api/faqs/by_category").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "category parameter is required");
}
