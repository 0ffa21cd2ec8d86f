//! End-to-end flows against a real database.
//!
//! Each test gets a fresh database from `sqlx::test` with the storefront
//! migrations applied. Set `DATABASE_URL` and run with `--ignored`.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use rust_decimal::Decimal;
use serde_json::{Value, json};
use sqlx::PgPool;

use chrono::{Duration, Utc};
use ojasritu_core::{OrderStatus, PaymentStatus, RejectReason};
use ojasritu_integration_tests::{TestApp, VALID_ID_TOKEN, decimal, seed_product, sign};
use ojasritu_storefront::db::orders::PaymentTransition;
use ojasritu_storefront::db::{CatalogRepository, OrderRepository, UserRepository};
use ojasritu_storefront::services::checkout::{CheckoutService, WebhookOutcome};
use ojasritu_storefront::services::payments::signature::sign_hex;

const PASSWORD: &str = "tulsi-and-ginger-42";

async fn signed_up(pool: &PgPool, email: &str) -> TestApp {
    let app = TestApp::new(pool.clone());
    app.start_session().await;
    let response = app
        .post(
            "/api/auth/signup",
            &json!({
                "email": email,
                "password": PASSWORD,
                "password_confirm": PASSWORD,
                "first_name": "Arjun",
            }),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.body);
    app
}

fn reset_path(text: &str) -> (String, String) {
    let start = text.find("/reset-password/").unwrap() + "/reset-password/".len();
    let rest: String = text[start..]
        .chars()
        .take_while(|c| !c.is_whitespace())
        .collect();
    let mut parts = rest.trim_end_matches('/').split('/');
    (
        parts.next().unwrap().to_string(),
        parts.next().unwrap().to_string(),
    )
}

// =============================================================================
// Identity
// =============================================================================

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_signup_signs_in(pool: PgPool) {
    let app = signed_up(&pool, "Arjun.Mehta@Example.com").await;

    let check = app.get("/api/auth/check").await;
    assert_eq!(check.body["authenticated"], true);
    assert_eq!(check.body["user"]["email"], "arjun.mehta@example.com");

    let user = UserRepository::new(&pool)
        .get_by_username("arjun.mehta@example.com")
        .await
        .unwrap();
    assert!(user.is_some());
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_signup_password_mismatch_creates_nothing(pool: PgPool) {
    let app = TestApp::new(pool.clone());
    app.start_session().await;

    let response = app
        .post(
            "/api/auth/signup",
            &json!({
                "email": "kavya@example.com",
                "password": PASSWORD,
                "password_confirm": "something-else-42",
            }),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let user = UserRepository::new(&pool)
        .get_by_email("kavya@example.com")
        .await
        .unwrap();
    assert!(user.is_none());
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_duplicate_signup_is_rejected(pool: PgPool) {
    let _first = signed_up(&pool, "rohan@example.com").await;

    let app = TestApp::new(pool.clone());
    app.start_session().await;
    let response = app
        .post(
            "/api/auth/signup",
            &json!({"email": "rohan@example.com", "password": PASSWORD, "password_confirm": PASSWORD}),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_logout_ends_session(pool: PgPool) {
    let app = signed_up(&pool, "isha@example.com").await;

    let response = app.post("/api/logout", &json!({})).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["success"], true);

    assert_eq!(app.get("/api/auth/check").await.body["authenticated"], false);
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_forgot_password_for_unknown_email_sends_nothing(pool: PgPool) {
    let app = TestApp::new(pool.clone());
    app.start_session().await;

    let response = app
        .post("/api/auth/forgot-password", &json!({"email": "nobody@example.com"}))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body["message"].is_string());
    assert!(app.mailer.sent.lock().unwrap().is_empty());
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_password_reset_round_trip(pool: PgPool) {
    let app = signed_up(&pool, "devika@example.com").await;

    let response = app
        .post("/api/auth/forgot-password", &json!({"email": "devika@example.com"}))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let sent = app.mailer.sent_to("devika@example.com");
    assert_eq!(sent.len(), 1);
    let (uid, token) = reset_path(&sent[0].text);

    let new_password = "brahmi-and-amla-77";
    let response = app
        .post(
            "/api/auth/reset-password",
            &json!({"uid": uid, "token": token, "password": new_password, "password_confirm": new_password}),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.body);

    // The link is single-use: the password hash it was derived from changed.
    let replay = app
        .post(
            "/api/auth/reset-password",
            &json!({"uid": uid, "token": token, "password": new_password, "password_confirm": new_password}),
        )
        .await;
    assert_eq!(replay.status, StatusCode::BAD_REQUEST);

    let login = app
        .post("/api/auth/login", &json!({"email": "devika@example.com", "password": new_password}))
        .await;
    assert_eq!(login.status, StatusCode::OK);
    assert_eq!(login.body["user"]["email"], "devika@example.com");
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_google_login_creates_account(pool: PgPool) {
    let app = TestApp::new(pool.clone());
    app.start_session().await;

    let response = app
        .post("/api/auth/google", &json!({"id_token": VALID_ID_TOKEN}))
        .await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.body);
    assert_eq!(response.body["user"]["email"], "meera.iyer@gmail.com");
    assert!(response.body["token"].is_string());

    let user = UserRepository::new(&pool)
        .get_by_email("meera.iyer@gmail.com")
        .await
        .unwrap()
        .unwrap();
    assert!(user.password_hash.is_none());
}

// =============================================================================
// Cart and checkout
// =============================================================================

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_adding_same_product_twice_increments_quantity(pool: PgPool) {
    let product = seed_product(&pool, "Ashwagandha Capsules", 100).await;
    let app = signed_up(&pool, "neel@example.com").await;

    let body = json!({"product_id": product.id.as_i32(), "quantity": 1});
    assert_eq!(app.post("/api/cart/add", &body).await.status, StatusCode::OK);
    let second = app.post("/api/cart/add", &body).await;
    assert_eq!(second.status, StatusCode::OK);
    assert_eq!(decimal(&second.body["cart_total"]), Decimal::new(200, 0));
    assert_eq!(second.body["cart_items_count"], 1);

    let cart = app.get("/api/cart").await;
    assert_eq!(cart.body["items"].as_array().unwrap().len(), 1);
    assert_eq!(cart.body["items"][0]["quantity"], 2);
    assert_eq!(decimal(&cart.body["total_price"]), Decimal::new(200, 0));
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_cart_rejects_out_of_range_quantity(pool: PgPool) {
    let product = seed_product(&pool, "Triphala Churna", 349).await;
    let app = signed_up(&pool, "tara@example.com").await;

    for quantity in [0, 101] {
        let response = app
            .post("/api/cart/add", &json!({"product_id": product.id.as_i32(), "quantity": quantity}))
            .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "quantity {quantity}");
    }
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_remove_item(pool: PgPool) {
    let product = seed_product(&pool, "Brahmi Oil", 450).await;
    let app = signed_up(&pool, "vikram@example.com").await;
    app.post("/api/cart/add", &json!({"product_id": product.id.as_i32()}))
        .await;

    let cart = app.get("/api/cart").await;
    let item_id = cart.body["items"][0]["id"].as_i64().unwrap();

    let removed = app.delete(&format!("/api/cart/remove/{item_id}")).await;
    assert_eq!(removed.status, StatusCode::OK);
    assert_eq!(decimal(&removed.body["cart_total"]), Decimal::ZERO);

    let again = app.delete(&format!("/api/cart/remove/{item_id}")).await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_checkout_with_empty_cart_creates_no_order(pool: PgPool) {
    let app = signed_up(&pool, "anaya@example.com").await;

    let response = app.post("/api/cashfree/create", &json!({})).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "Cart is empty");

    let orders = OrderRepository::new(&pool).list(None).await.unwrap();
    assert!(orders.is_empty());
    assert!(app.gateway.created.lock().unwrap().is_empty());
}

async fn paid_checkout(pool: &PgPool, email: &str) -> (TestApp, String) {
    let product = seed_product(pool, "Chyawanprash", 100).await;
    let app = signed_up(pool, email).await;
    app.post("/api/cart/add", &json!({"product_id": product.id.as_i32(), "quantity": 2}))
        .await;

    let created = app.post("/api/cashfree/create", &json!({})).await;
    assert_eq!(created.status, StatusCode::OK, "{}", created.body);
    let order_id = created.body["order_id"].as_str().unwrap().to_string();
    assert_eq!(
        created.body["payment_session_id"],
        Value::String(format!("session_{order_id}"))
    );
    assert_eq!(
        app.gateway.created.lock().unwrap()[0].amount,
        Decimal::new(200, 0)
    );
    (app, order_id)
}

fn notification(order_id: &str, status: &str) -> String {
    json!({
        "type": "PAYMENT_WEBHOOK",
        "data": {
            "order": {"order_id": order_id},
            "payment": {"payment_status": status, "cf_payment_id": 5_114_910_233_u64}
        }
    })
    .to_string()
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_webhook_marks_order_paid_once(pool: PgPool) {
    let (app, order_id) = paid_checkout(&pool, "sanjay@example.com").await;

    let pending = app.get(&format!("/api/orders/{order_id}")).await;
    assert_eq!(pending.body["payment_status"], "pending");

    let body = notification(&order_id, "SUCCESS");
    let first = app.webhook(&body, Some(&sign(body.as_bytes()))).await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body["success"], true);

    let paid = app.get(&format!("/api/orders/{order_id}")).await;
    assert_eq!(paid.body["payment_status"], "paid");
    assert_eq!(paid.body["transaction_id"], "5114910233");
    let updated_at = paid.body["updated_at"].clone();

    // Replays are acknowledged and change nothing.
    let replay = app.webhook(&body, Some(&sign(body.as_bytes()))).await;
    assert_eq!(replay.status, StatusCode::OK);
    let after = app.get(&format!("/api/orders/{order_id}")).await;
    assert_eq!(after.body["payment_status"], "paid");
    assert_eq!(after.body["updated_at"], updated_at);

    // A late failure never downgrades a paid order.
    let failed = notification(&order_id, "FAILED");
    let late = app.webhook(&failed, Some(&sign(failed.as_bytes()))).await;
    assert_eq!(late.status, StatusCode::OK);
    let still = app.get(&format!("/api/orders/{order_id}")).await;
    assert_eq!(still.body["payment_status"], "paid");
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_failed_payment_retried_to_paid(pool: PgPool) {
    let (app, order_id) = paid_checkout(&pool, "devika@example.com").await;
    let repo = OrderRepository::new(&pool);

    let failed = notification(&order_id, "FAILED");
    let response = app.webhook(&failed, Some(&sign(failed.as_bytes()))).await;
    assert_eq!(response.status, StatusCode::OK);

    let order = repo.find_by_gateway_order_id(&order_id).await.unwrap().unwrap();
    assert_eq!(order.payment_status, PaymentStatus::Failed);
    assert_eq!(order.status, OrderStatus::Cancelled);

    let success = notification(&order_id, "SUCCESS");
    let response = app.webhook(&success, Some(&sign(success.as_bytes()))).await;
    assert_eq!(response.status, StatusCode::OK);

    let order = repo.find_by_gateway_order_id(&order_id).await.unwrap().unwrap();
    assert_eq!(order.payment_status, PaymentStatus::Paid);
    assert_eq!(order.status, OrderStatus::Confirmed);
    assert_eq!(order.transaction_id.as_deref(), Some("5114910233"));

    // Paid is terminal: a later failure report leaves the row alone.
    let response = app.webhook(&failed, Some(&sign(failed.as_bytes()))).await;
    assert_eq!(response.status, StatusCode::OK);
    let order = repo.find_by_gateway_order_id(&order_id).await.unwrap().unwrap();
    assert_eq!(order.payment_status, PaymentStatus::Paid);
    assert_eq!(order.status, OrderStatus::Confirmed);
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_compare_and_set_refuses_stale_expectation(pool: PgPool) {
    let (_app, order_id) = paid_checkout(&pool, "nikhil@example.com").await;
    let repo = OrderRepository::new(&pool);
    let order = repo.find_by_gateway_order_id(&order_id).await.unwrap().unwrap();

    let stale_payment = repo
        .compare_and_set_payment(
            order.id,
            PaymentTransition {
                expected: PaymentStatus::Failed,
                expected_order: OrderStatus::Pending,
                to: PaymentStatus::Paid,
                order_status: Some(OrderStatus::Confirmed),
                transaction_id: None,
            },
        )
        .await
        .unwrap();
    assert!(!stale_payment);

    let stale_fulfillment = repo
        .compare_and_set_payment(
            order.id,
            PaymentTransition {
                expected: PaymentStatus::Pending,
                expected_order: OrderStatus::Shipped,
                to: PaymentStatus::Paid,
                order_status: Some(OrderStatus::Confirmed),
                transaction_id: None,
            },
        )
        .await
        .unwrap();
    assert!(!stale_fulfillment);

    let unchanged = repo.get(order.id).await.unwrap().unwrap();
    assert_eq!(unchanged.payment_status, PaymentStatus::Pending);
    assert_eq!(unchanged.status, OrderStatus::Pending);
    assert_eq!(unchanged.updated_at, order.updated_at);
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_lost_race_is_decided_again_on_fresh_row(pool: PgPool) {
    let (app, order_id) = paid_checkout(&pool, "rhea@example.com").await;
    let repo = OrderRepository::new(&pool);
    let snapshot = repo.find_by_gateway_order_id(&order_id).await.unwrap().unwrap();
    assert_eq!(snapshot.payment_status, PaymentStatus::Pending);

    // Another delivery wins while the snapshot is still pending.
    let success = notification(&order_id, "SUCCESS");
    let response = app.webhook(&success, Some(&sign(success.as_bytes()))).await;
    assert_eq!(response.status, StatusCode::OK);

    let outcome = CheckoutService::new(&pool)
        .transition(snapshot, PaymentStatus::Failed, None)
        .await
        .unwrap();
    assert_eq!(outcome, WebhookOutcome::Ignored(RejectReason::AlreadyPaid));

    let order = repo.find_by_gateway_order_id(&order_id).await.unwrap().unwrap();
    assert_eq!(order.payment_status, PaymentStatus::Paid);
    assert_eq!(order.status, OrderStatus::Confirmed);
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_webhook_with_bad_signature_changes_nothing(pool: PgPool) {
    let (app, order_id) = paid_checkout(&pool, "gauri@example.com").await;

    let body = notification(&order_id, "SUCCESS");
    let forged = sign_hex(b"not-the-secret", body.as_bytes());
    let response = app.webhook(&body, Some(&forged)).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let order = app.get(&format!("/api/orders/{order_id}")).await;
    assert_eq!(order.body["payment_status"], "pending");
    assert_eq!(order.body["status"], "pending");
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_gateway_outage_leaves_order_for_sweep(pool: PgPool) {
    let product = seed_product(&pool, "Neem Capsules", 250).await;
    signed_up(&pool, "harsh@example.com").await;

    let app = TestApp::with_failing_gateway(pool.clone());
    app.start_session().await;
    let login = app
        .post("/api/auth/login", &json!({"email": "harsh@example.com", "password": PASSWORD}))
        .await;
    assert_eq!(login.status, StatusCode::OK);
    app.post("/api/cart/add", &json!({"product_id": product.id.as_i32()}))
        .await;

    let response = app.post("/api/cashfree/create", &json!({})).await;
    assert_eq!(response.status, StatusCode::BAD_GATEWAY);
    assert_eq!(response.body["error"], "Payment gateway error: unavailable");

    let orders = OrderRepository::new(&pool).list(None).await.unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].payment_status.as_str(), "pending");

    let report = CheckoutService::new(&pool)
        .sweep_stale(Utc::now() + Duration::minutes(1))
        .await
        .unwrap();
    assert_eq!(report.voided, 1);

    let order = OrderRepository::new(&pool).get(orders[0].id).await.unwrap().unwrap();
    assert_eq!(order.payment_status.as_str(), "failed");
    assert_eq!(order.status.as_str(), "cancelled");
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_webhook_for_unknown_order_is_404(pool: PgPool) {
    let app = TestApp::new(pool);
    let body = notification("CF-FFFFFFFFFFFFFFFF", "SUCCESS");
    let response = app.webhook(&body, Some(&sign(body.as_bytes()))).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_orders_are_private(pool: PgPool) {
    let (_owner, order_id) = paid_checkout(&pool, "priya@example.com").await;
    let other = signed_up(&pool, "kabir@example.com").await;

    let response = other.get(&format!("/api/orders/{order_id}")).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert!(other.get("/api/orders").await.body.as_array().unwrap().is_empty());
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_cash_on_delivery_order_clears_cart(pool: PgPool) {
    let product = seed_product(&pool, "Kumkumadi Tailam", 1_200).await;
    let app = signed_up(&pool, "lakshmi@example.com").await;
    app.post("/api/cart/add", &json!({"product_id": product.id.as_i32()}))
        .await;

    let response = app
        .post(
            "/api/orders",
            &json!({"shipping_address": "12 MG Road, Pune", "phone_number": "9876543210"}),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    assert!(response.body["order_id"].as_str().unwrap().starts_with("ORD"));
    assert_eq!(response.body["payment_method"], "cod");

    let cart = app.get("/api/cart").await;
    assert!(cart.body["items"].as_array().is_none_or(Vec::is_empty));
}

// =============================================================================
// Reviews
// =============================================================================

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_reviews_update_product_rating(pool: PgPool) {
    let product = seed_product(&pool, "Ashwagandha Churna", 399).await;
    let path = format!("/api/products/{}/reviews", product.slug);

    let first = signed_up(&pool, "aditi@example.com").await;
    let response = first
        .post(&path, &json!({"rating": 5, "title": "Calming", "comment": "Sleep is better"}))
        .await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);

    let second = signed_up(&pool, "manav@example.com").await;
    let response = second.post(&path, &json!({"rating": 2, "comment": "Too bitter"})).await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);

    let stored = CatalogRepository::new(&pool)
        .get_product(&product.slug)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.total_reviews, 2);
    assert_eq!(stored.rating, Decimal::new(350, 2));

    // One review per user and product; the aggregate is untouched.
    let again = first.post(&path, &json!({"rating": 1})).await;
    assert_eq!(again.status, StatusCode::BAD_REQUEST);
    assert_eq!(again.body["error"], "You have already reviewed this product");

    let stored = CatalogRepository::new(&pool)
        .get_product(&product.slug)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.total_reviews, 2);
    assert_eq!(stored.rating, Decimal::new(350, 2));

    let listed = first.get(&path).await;
    assert_eq!(listed.body.as_array().unwrap().len(), 2);
}
