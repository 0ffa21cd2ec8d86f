//! In-process test harness for the storefront API.
//!
//! Requests go through the full middleware stack with `tower::ServiceExt`
//! instead of a listening socket. Remote services are replaced with the
//! fakes in this crate, and sessions live in a `MemoryStore`.
//!
//! # Running Tests
//!
//! ```bash
//! # Offline tests (no database)
//! cargo test -p ojasritu-integration-tests
//!
//! # Database-backed flows
//! DATABASE_URL=postgres://localhost/ojasritu_test \
//!     cargo test -p ojasritu-integration-tests -- --ignored
//! ```

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use secrecy::SecretString;
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;
use tower_http::normalize_path::NormalizePath;
use tower_sessions::MemoryStore;

use ojasritu_core::{ProductDosha, ProductStatus};
use ojasritu_storefront::config::{EmailConfig, StorefrontConfig};
use ojasritu_storefront::db::CatalogRepository;
use ojasritu_storefront::middleware::session::{SESSION_COOKIE_NAME, session_layer};
use ojasritu_storefront::models::catalog::{NewProduct, Product};
use ojasritu_storefront::services::auth::{IdTokenVerifier, IdentityError, VerifiedIdentity};
use ojasritu_storefront::services::mail::{MailError, Mailer, OutgoingEmail};
use ojasritu_storefront::services::payments::signature::{sign_base64, verify_signature};
use ojasritu_storefront::services::payments::{
    GatewayOrder, GatewayOrderRequest, PaymentError, PaymentGateway,
};
use ojasritu_storefront::state::{AppState, Services};
use ojasritu_storefront::{app, with_trailing_slash_tolerance};

/// Webhook key shared by [`FakeGateway`] and [`sign`].
pub const WEBHOOK_SECRET: &[u8] = b"cf_test_secret_key_for_webhooks";

/// ID token [`FakeIdentity`] accepts.
pub const VALID_ID_TOKEN: &str = "google-id-token-ok";

/// Configuration that needs no environment.
#[must_use]
pub fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        database_url: SecretString::from("postgres://localhost/ojasritu_unused"),
        host: "127.0.0.1".parse().unwrap(),
        port: 8000,
        base_url: "http://localhost:8000".to_string(),
        frontend_url: "http://localhost:5173".to_string(),
        session_secret: SecretString::from("k3J9vQ2mX7pL4wR8tY1zN6bH5cF0dG2s"),
        allowed_hosts: Vec::new(),
        cashfree: None,
        google_client_id: None,
        openai: None,
        email: EmailConfig {
            smtp: None,
            from_address: "Ojasritu <no-reply@ojasritu.co.in>".to_string(),
        },
        sentry_dsn: None,
        sentry_environment: None,
    }
}

/// A pool that never connects. Fine for routes that fail before touching
/// the database.
#[must_use]
pub fn lazy_pool() -> PgPool {
    sqlx::postgres::PgPoolOptions::new()
        .connect_lazy("postgres://localhost/ojasritu_unused")
        .unwrap()
}

/// HMAC signature the gateway would send for `body`.
#[must_use]
pub fn sign(body: &[u8]) -> String {
    sign_base64(WEBHOOK_SECRET, body)
}

// =============================================================================
// Fakes
// =============================================================================

/// Gateway that hands out predictable sessions and checks real signatures.
#[derive(Default)]
pub struct FakeGateway {
    pub created: Mutex<Vec<GatewayOrderRequest>>,
    pub fail: bool,
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_order(&self, request: &GatewayOrderRequest) -> Result<GatewayOrder, PaymentError> {
        if self.fail {
            return Err(PaymentError::Unreachable("connection refused".to_string()));
        }
        self.created.lock().unwrap().push(request.clone());
        Ok(GatewayOrder {
            payment_session_id: format!("session_{}", request.order_id),
            payment_redirect_url: None,
        })
    }

    fn verify_webhook(&self, body: &[u8], signature: &str) -> bool {
        verify_signature(WEBHOOK_SECRET, body, signature)
    }
}

/// Mailer that keeps what it was asked to send.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<OutgoingEmail>>,
}

impl RecordingMailer {
    #[must_use]
    pub fn sent_to(&self, address: &str) -> Vec<OutgoingEmail> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.to == address)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

/// Accepts [`VALID_ID_TOKEN`] as `meera.iyer@gmail.com`.
pub struct FakeIdentity;

#[async_trait]
impl IdTokenVerifier for FakeIdentity {
    async fn verify(&self, id_token: &str) -> Result<VerifiedIdentity, IdentityError> {
        if id_token == VALID_ID_TOKEN {
            Ok(VerifiedIdentity {
                email: "meera.iyer@gmail.com".to_string(),
                given_name: "Meera".to_string(),
                family_name: "Iyer".to_string(),
            })
        } else {
            Err(IdentityError::InvalidToken("aud mismatch".to_string()))
        }
    }
}

// =============================================================================
// Test application
// =============================================================================

/// Response with the body decoded as JSON (`Value::Null` when empty).
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    /// The `name=value` part of the session cookie, if one was set.
    #[must_use]
    pub fn session_cookie(&self) -> Option<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| v.starts_with(SESSION_COOKIE_NAME))
            .and_then(|v| v.split(';').next())
            .map(str::to_string)
    }
}

/// A browser-like client: keeps the session cookie and CSRF token.
pub struct TestApp {
    service: NormalizePath<Router>,
    pub gateway: Arc<FakeGateway>,
    pub mailer: Arc<RecordingMailer>,
    cookie: Mutex<Option<String>>,
    csrf: Mutex<Option<String>>,
}

impl TestApp {
    /// App over `pool` with every remote service faked.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        let gateway = Arc::new(FakeGateway::default());
        let mailer = Arc::new(RecordingMailer::default());
        let services = Services {
            gateway: Some(gateway.clone() as Arc<dyn PaymentGateway>),
            identity: Some(Arc::new(FakeIdentity)),
            mailer: mailer.clone() as Arc<dyn Mailer>,
            chat: None,
        };
        Self::build(pool, services, gateway, mailer)
    }

    /// App over `pool` whose gateway is unreachable.
    #[must_use]
    pub fn with_failing_gateway(pool: PgPool) -> Self {
        let gateway = Arc::new(FakeGateway {
            fail: true,
            ..FakeGateway::default()
        });
        let mailer = Arc::new(RecordingMailer::default());
        let services = Services {
            gateway: Some(gateway.clone() as Arc<dyn PaymentGateway>),
            identity: None,
            mailer: mailer.clone() as Arc<dyn Mailer>,
            chat: None,
        };
        Self::build(pool, services, gateway, mailer)
    }

    /// App with no database and no remote services.
    #[must_use]
    pub fn offline() -> Self {
        Self::build(
            lazy_pool(),
            Services::offline(),
            Arc::new(FakeGateway::default()),
            Arc::new(RecordingMailer::default()),
        )
    }

    /// App with no database but with the fakes wired in.
    #[must_use]
    pub fn offline_with_fakes() -> Self {
        Self::new(lazy_pool())
    }

    fn build(
        pool: PgPool,
        services: Services,
        gateway: Arc<FakeGateway>,
        mailer: Arc<RecordingMailer>,
    ) -> Self {
        let state = AppState::with_services(test_config(), pool, services);
        let service = with_trailing_slash_tolerance(app(
            state,
            session_layer(MemoryStore::default(), false),
        ));
        Self {
            service,
            gateway,
            mailer,
            cookie: Mutex::new(None),
            csrf: Mutex::new(None),
        }
    }

    /// Send a request as-is, without cookie or CSRF handling.
    pub async fn raw(&self, request: Request<Body>) -> TestResponse {
        let response = self.service.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Send a request with the stored session cookie and CSRF token.
    ///
    /// A client IP header is always set so rate-limited routes can key it.
    pub async fn send(&self, method: Method, uri: &str, body: Option<&Value>) -> TestResponse {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("x-forwarded-for", "203.0.113.10");

        if let Some(cookie) = self.cookie.lock().unwrap().clone() {
            builder = builder.header(header::COOKIE, cookie);
        }
        if let Some(token) = self.csrf.lock().unwrap().clone() {
            builder = builder.header("x-csrftoken", token);
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.raw(request).await;
        if let Some(cookie) = response.session_cookie() {
            *self.cookie.lock().unwrap() = Some(cookie);
        }
        response
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: &Value) -> TestResponse {
        self.send(Method::POST, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> TestResponse {
        self.send(Method::DELETE, uri, None).await
    }

    /// Fetch a CSRF token so later unsafe requests pass the check.
    pub async fn start_session(&self) {
        let response = self.get("/api/auth/csrf").await;
        assert_eq!(response.status, StatusCode::OK);
        self.use_csrf_token(response.body["csrftoken"].as_str().unwrap().to_string());
    }

    #[must_use]
    pub fn csrf_token(&self) -> Option<String> {
        self.csrf.lock().unwrap().clone()
    }

    /// Present `token` on later unsafe requests.
    pub fn use_csrf_token(&self, token: String) {
        *self.csrf.lock().unwrap() = Some(token);
    }

    /// Post a webhook body signed with `signature`.
    pub async fn webhook(&self, body: &str, signature: Option<&str>) -> TestResponse {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri("/api/cashfree/webhook")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(signature) = signature {
            builder = builder.header("x-cashfree-signature", signature);
        }
        self.raw(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }
}

/// Insert an active product at `price` rupees.
pub async fn seed_product(pool: &PgPool, name: &str, price: i64) -> Product {
    CatalogRepository::new(pool)
        .create_product(&NewProduct {
            name: name.to_string(),
            hindi_name: String::new(),
            slug: None,
            description: String::new(),
            benefits: String::new(),
            ingredients: String::new(),
            usage_instructions: String::new(),
            price: rust_decimal::Decimal::new(price, 0),
            discount_price: None,
            category: None,
            image_url: None,
            dosha_type: ProductDosha::default(),
            quantity_in_stock: 25,
            sku: None,
            status: ProductStatus::Active,
            is_bestseller: false,
            is_featured: false,
        })
        .await
        .unwrap()
}

/// Decimal out of a JSON string or number.
#[must_use]
pub fn decimal(value: &Value) -> rust_decimal::Decimal {
    match value {
        Value::String(s) => s.parse().unwrap(),
        Value::Number(n) => n.to_string().parse().unwrap(),
        other => panic!("not a decimal: {other}"),
    }
}
