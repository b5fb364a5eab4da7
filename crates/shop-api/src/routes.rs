//! # Routes
//!
//! Axum router configuration for the storefront API.

use crate::gate::require_auth;
use crate::handlers;
use crate::state::AppState;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use shop_auth::SESSION_COOKIE;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tower_sessions::{
    cookie::{Key, SameSite},
    MemoryStore, SessionManagerLayer,
};

/// Create the main application router
///
/// Routes:
/// - Public:
///   - GET  /health - Health check
///   - POST /auth/login - Email/password login
///   - GET  /auth/logout - End the session
///   - POST /create-payment-intent - Payment intent for an order
///   - POST /webhook - Payment processor events (signed)
///
/// - Behind the access gate:
///   - GET /auth/check - Echo the caller's identity
///   - GET /users/own - The caller's identity, re-read from the store
///   - POST /orders - Create a pending order
///   - GET /orders/own - The caller's orders
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let key_material = state.auth.session_key_material();
    let sessions = SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE)
        .with_http_only(true)
        .with_same_site(SameSite::Lax)
        .with_secure(state.auth.secure_cookies)
        .with_signed(Key::from(&key_material[..]));

    // Identity is attached by the gate before any of these run
    let protected_routes = Router::new()
        .route("/auth/check", get(handlers::check))
        .route("/users/own", get(handlers::users_own))
        .route("/orders", post(handlers::create_order))
        .route("/orders/own", get(handlers::orders_own))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let public_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/auth/login", post(handlers::login))
        .route("/auth/logout", get(handlers::logout))
        .route("/create-payment-intent", post(handlers::create_payment_intent))
        .route("/webhook", post(handlers::payment_webhook));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        // Middleware
        .layer(sessions)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        // State
        .with_state(state)
}
