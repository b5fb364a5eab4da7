use axum::http::{header::COOKIE, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::{json, Value};
use shop_api::{create_router, AppConfig, AppState};
use shop_auth::{hash_password, AuthConfig, TokenClaims, TokenSigner, SESSION_COOKIE, TOKEN_COOKIE};
use shop_core::{
    BoxedPaymentProcessor, MemoryCredentialStore, MemoryOrderStore, OrderRecord, OrderStore,
    PaymentStatus, Role, UserRecord,
};
use shop_stripe::{compute_signature, StripeConfig, StripePaymentProcessor};
use std::sync::Arc;

const ITERATIONS: u32 = 1_000;
const EMAIL: &str = "a@x.com";
const PASSWORD: &str = "correct horse battery staple";
const USER_ID: &str = "user-1";
const WEBHOOK_SECRET: &str = "whsec_test_secret";

fn auth_config() -> AuthConfig {
    AuthConfig::new(
        "jwt-secret-0123456789abcdef0123456789",
        "session-secret-0123456789abcdef01234567",
    )
    .with_kdf_iterations(ITERATIONS)
}

fn credentials() -> Arc<MemoryCredentialStore> {
    let (hash, salt) = hash_password(PASSWORD, ITERATIONS);
    let user = UserRecord::new(EMAIL, Role::User, hash, salt).with_id(USER_ID);
    Arc::new(MemoryCredentialStore::new().with_user(user))
}

fn payments() -> BoxedPaymentProcessor {
    let config = StripeConfig::new("sk_test_abc123", WEBHOOK_SECRET);
    Arc::new(StripePaymentProcessor::new(config).unwrap())
}

fn app_with(orders: Arc<MemoryOrderStore>, payments: Option<BoxedPaymentProcessor>) -> TestServer {
    let state = AppState::with_parts(
        AppConfig::default(),
        auth_config(),
        credentials(),
        orders,
        payments,
    );
    TestServer::new(create_router(state)).unwrap()
}

fn app() -> TestServer {
    app_with(Arc::new(MemoryOrderStore::new()), None)
}

fn cookie(name: &str, value: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("{}={}", name, value)).unwrap()
}

async fn login(server: &TestServer) -> axum_test::TestResponse {
    server
        .post("/auth/login")
        .json(&json!({ "email": EMAIL, "password": PASSWORD }))
        .await
}

#[tokio::test]
async fn test_health() {
    let response = app().get("/health").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_login_returns_sanitized_identity_and_cookies() {
    let server = app();
    let response = login(&server).await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["id"], USER_ID);
    assert_eq!(body["role"], "user");
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert!(body.get("password_hash").is_none());
    assert!(body.get("salt").is_none());

    let jwt = response.cookie(TOKEN_COOKIE);
    assert_eq!(jwt.value(), body["token"].as_str().unwrap());
    assert_eq!(jwt.http_only(), Some(true));
    assert!(response.maybe_cookie(SESSION_COOKIE).is_some());
}

#[tokio::test]
async fn test_session_cookie_alone_passes_the_gate() {
    let server = app();
    let session = login(&server).await.cookie(SESSION_COOKIE);

    let response = server
        .get("/auth/check")
        .add_header(COOKIE, cookie(SESSION_COOKIE, session.value()))
        .await;

    response.assert_status_ok();
    response.assert_json(&json!({ "id": USER_ID, "role": "user" }));
}

#[tokio::test]
async fn test_token_cookie_alone_passes_the_gate() {
    let server = app();
    let body: Value = login(&server).await.json();
    let token = body["token"].as_str().unwrap();

    let response = server
        .get("/users/own")
        .add_header(COOKIE, cookie(TOKEN_COOKIE, token))
        .await;

    response.assert_status_ok();
    response.assert_json(&json!({ "id": USER_ID, "role": "user" }));
}

#[tokio::test]
async fn test_wrong_password_and_unknown_email_are_indistinguishable() {
    let server = app();

    let wrong_password = server
        .post("/auth/login")
        .json(&json!({ "email": EMAIL, "password": "nope" }))
        .await;
    let unknown_email = server
        .post("/auth/login")
        .json(&json!({ "email": "b@x.com", "password": PASSWORD }))
        .await;

    wrong_password.assert_status_unauthorized();
    unknown_email.assert_status_unauthorized();
    assert_eq!(wrong_password.text(), unknown_email.text());

    let body: Value = wrong_password.json();
    assert_eq!(body["error"], "invalid credentials");
    assert!(wrong_password.maybe_cookie(TOKEN_COOKIE).is_none());
}

#[tokio::test]
async fn test_no_credentials_is_rejected() {
    let response = app().get("/auth/check").await;

    response.assert_status_unauthorized();
    let body: Value = response.json();
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn test_expired_token_without_session_is_rejected() {
    let now = chrono::Utc::now().timestamp();
    let claims = TokenClaims {
        id: USER_ID.to_string(),
        role: Role::User,
        iat: now - 7200,
        exp: now - 60,
    };
    let expired = TokenSigner::new(&auth_config()).sign_claims(&claims).unwrap();

    let response = app()
        .get("/auth/check")
        .add_header(COOKIE, cookie(TOKEN_COOKIE, &expired))
        .await;

    response.assert_status_unauthorized();
    let body: Value = response.json();
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn test_token_for_deleted_user_is_rejected() {
    let claims = TokenClaims::new(
        &shop_core::SanitizedIdentity {
            id: "gone".to_string(),
            role: Role::Admin,
        },
        3600,
    );
    let token = TokenSigner::new(&auth_config()).sign_claims(&claims).unwrap();

    app()
        .get("/users/own")
        .add_header(COOKIE, cookie(TOKEN_COOKIE, &token))
        .await
        .assert_status_unauthorized();
}

#[tokio::test]
async fn test_logout_invalidates_session() {
    let server = app();
    let session = login(&server).await.cookie(SESSION_COOKIE);
    let session_cookie = cookie(SESSION_COOKIE, session.value());

    let response = server
        .get("/auth/logout")
        .add_header(COOKIE, session_cookie.clone())
        .await;
    response.assert_status_ok();
    assert_eq!(response.cookie(TOKEN_COOKIE).value(), "");

    server
        .get("/auth/check")
        .add_header(COOKIE, session_cookie)
        .await
        .assert_status_unauthorized();
}

#[tokio::test]
async fn test_payment_intent_without_processor_is_unavailable() {
    app()
        .post("/create-payment-intent")
        .json(&json!({ "totalAmounts": 499.0, "orderId": "ord_1" }))
        .await
        .assert_status(StatusCode::SERVICE_UNAVAILABLE);
}

fn signed_webhook(payload: &[u8], secret: &str) -> HeaderValue {
    let now = chrono::Utc::now().timestamp();
    let signature = compute_signature(secret, now, payload).unwrap();
    HeaderValue::from_str(&format!("t={},v1={}", now, signature)).unwrap()
}

fn succeeded_payload(order_id: &str) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "id": "evt_1",
        "type": "payment_intent.succeeded",
        "created": chrono::Utc::now().timestamp(),
        "data": {
            "object": {
                "id": "pi_1",
                "amount": 49900,
                "metadata": { "orderId": order_id }
            }
        }
    }))
    .unwrap()
}

#[tokio::test]
async fn test_signed_webhook_marks_order_paid() {
    let orders = Arc::new(MemoryOrderStore::new());
    let order = OrderRecord::new(USER_ID, 49900);
    let order_id = order.id.clone();
    orders.insert(order).await;

    let server = app_with(orders.clone(), Some(payments()));
    let payload = succeeded_payload(&order_id);

    server
        .post("/webhook")
        .add_header(
            axum::http::HeaderName::from_static("stripe-signature"),
            signed_webhook(&payload, WEBHOOK_SECRET),
        )
        .bytes(payload.into())
        .await
        .assert_status_ok();

    let order = orders.find(&order_id).await.unwrap();
    assert_eq!(order.payment_status, PaymentStatus::Received);
}

#[tokio::test]
async fn test_badly_signed_webhook_is_rejected() {
    let orders = Arc::new(MemoryOrderStore::new());
    let order = OrderRecord::new(USER_ID, 49900);
    let order_id = order.id.clone();
    orders.insert(order).await;

    let server = app_with(orders.clone(), Some(payments()));
    let payload = succeeded_payload(&order_id);

    server
        .post("/webhook")
        .add_header(
            axum::http::HeaderName::from_static("stripe-signature"),
            signed_webhook(&payload, "whsec_someone_else"),
        )
        .bytes(payload.into())
        .await
        .assert_status_bad_request();

    server
        .post("/webhook")
        .bytes(succeeded_payload(&order_id).into())
        .await
        .assert_status_bad_request();

    let order = orders.find(&order_id).await.unwrap();
    assert_eq!(order.payment_status, PaymentStatus::Pending);
}

#[tokio::test]
async fn test_order_created_through_api_is_settled_by_webhook() {
    let orders = Arc::new(MemoryOrderStore::new());
    let server = app_with(orders.clone(), Some(payments()));
    let session = login(&server).await.cookie(SESSION_COOKIE);
    let session_cookie = cookie(SESSION_COOKIE, session.value());

    let created = server
        .post("/orders")
        .add_header(COOKIE, session_cookie.clone())
        .json(&json!({ "totalAmount": 499.0 }))
        .await;
    created.assert_status(StatusCode::CREATED);
    let body: Value = created.json();
    assert_eq!(body["user_id"], USER_ID);
    assert_eq!(body["total_amount"], 49900);
    assert_eq!(body["payment_status"], "pending");
    let order_id = body["id"].as_str().unwrap().to_string();

    let payload = succeeded_payload(&order_id);
    server
        .post("/webhook")
        .add_header(
            axum::http::HeaderName::from_static("stripe-signature"),
            signed_webhook(&payload, WEBHOOK_SECRET),
        )
        .bytes(payload.into())
        .await
        .assert_status_ok();

    let own: Value = server
        .get("/orders/own")
        .add_header(COOKIE, session_cookie)
        .await
        .json();
    assert_eq!(own.as_array().map(Vec::len), Some(1));
    assert_eq!(own[0]["id"], order_id.as_str());
    assert_eq!(own[0]["payment_status"], "received");
}

#[tokio::test]
async fn test_orders_require_authentication() {
    let server = app();

    server
        .post("/orders")
        .json(&json!({ "totalAmount": 10.0 }))
        .await
        .assert_status_unauthorized();
    server.get("/orders/own").await.assert_status_unauthorized();
}

#[tokio::test]
async fn test_order_with_bad_amount_is_rejected() {
    let server = app();
    let body: Value = login(&server).await.json();
    let token = body["token"].as_str().unwrap();

    server
        .post("/orders")
        .add_header(COOKIE, cookie(TOKEN_COOKIE, token))
        .json(&json!({ "totalAmount": -3.0 }))
        .await
        .assert_status_bad_request();
}
