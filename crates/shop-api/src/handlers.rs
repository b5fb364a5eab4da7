//! # Request Handlers
//!
//! Axum request handlers for the storefront API.
//! Error bodies carry only the generic public message; detail goes to the log.

use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::State,
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::{AppendHeaders, IntoResponse},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use shop_auth::{session, IssuedCredentials, TOKEN_COOKIE};
use shop_core::{
    sanitize, to_smallest_unit, AuthError, CredentialStore, LookupError, OrderRecord,
    OrderStore, PaymentError, SanitizedIdentity,
};
use shop_stripe::{dispatch_payment_event, OrderPaymentHandler};
use tower_sessions::Session;
use tracing::{debug, error, info, instrument};

// =============================================================================
// Request/Response Types
// =============================================================================

/// Login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Create order request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    /// Order total in major units
    pub total_amount: f64,
}

/// Create payment intent request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentIntentRequest {
    /// Order total in major units (e.g. rupees)
    pub total_amounts: f64,
    /// Order the payment is for
    pub order_id: String,
}

/// Create payment intent response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentIntentResponse {
    pub client_secret: String,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: u16) -> Self {
        Self {
            error: error.into(),
            code,
        }
    }
}

type ApiError = (StatusCode, Json<ErrorResponse>);

pub(crate) fn auth_error_to_response(err: AuthError) -> ApiError {
    let code = err.status_code();
    if err.is_client_error() {
        debug!("Auth rejected: {}", err);
    } else {
        error!("Auth failure: {}", err);
    }
    (
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(ErrorResponse::new(err.public_message(), code)),
    )
}

fn payment_error_to_response(err: PaymentError) -> ApiError {
    let code = err.status_code();
    error!("Payment failure: {}", err);
    let message = match &err {
        PaymentError::InvalidRequest(_)
        | PaymentError::WebhookVerificationFailed(_)
        | PaymentError::WebhookParseError(_) => err.to_string(),
        _ => shop_core::error::INTERNAL_ERROR.to_string(),
    };
    (
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(ErrorResponse::new(message, code)),
    )
}

fn order_store_error(err: LookupError) -> ApiError {
    error!("Order store failure: {}", err);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new(shop_core::error::INTERNAL_ERROR, 500)),
    )
}

fn payments_disabled() -> ApiError {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ErrorResponse::new("payments not configured", 503)),
    )
}

fn token_cookie(value: &str, max_age_secs: i64, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        TOKEN_COOKIE, value, max_age_secs
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "storefront",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Email/password login.
///
/// Returns 201 with `{id, role, token}`, the `jwt` cookie and (via the
/// session layer) the session cookie.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let issued: IssuedCredentials = state
        .login
        .login(&session, &request.email, &request.password)
        .await
        .map_err(auth_error_to_response)?;

    let cookie = token_cookie(
        &issued.token,
        state.login.issuer().token_ttl_secs(),
        state.auth.secure_cookies,
    );

    Ok((
        StatusCode::CREATED,
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(issued),
    ))
}

/// Echo the identity attached by the access gate
pub async fn check(Extension(identity): Extension<SanitizedIdentity>) -> Json<SanitizedIdentity> {
    Json(identity)
}

/// Destroy the session and expire the `jwt` cookie
#[instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    session: Session,
) -> Result<impl IntoResponse, ApiError> {
    session::destroy(&session)
        .await
        .map_err(auth_error_to_response)?;

    Ok((
        AppendHeaders([(SET_COOKIE, token_cookie("", 0, state.auth.secure_cookies))]),
        Json(serde_json::json!({ "message": "logged out" })),
    ))
}

/// The caller's own identity, re-read from the credential store
#[instrument(skip_all)]
pub async fn users_own(
    State(state): State<AppState>,
    Extension(identity): Extension<SanitizedIdentity>,
) -> Result<Json<SanitizedIdentity>, ApiError> {
    match state.credentials.find_by_id(&identity.id).await {
        Ok(user) => Ok(Json(sanitize(&user))),
        Err(LookupError::NotFound) => Err(auth_error_to_response(
            AuthError::IdentityNotResolvable { id: identity.id },
        )),
        Err(LookupError::Unavailable(msg)) => {
            Err(auth_error_to_response(AuthError::LookupFailure(msg)))
        }
    }
}

/// Create a pending order owned by the caller
#[instrument(skip_all, fields(user_id = %identity.id))]
pub async fn create_order(
    State(state): State<AppState>,
    Extension(identity): Extension<SanitizedIdentity>,
    Json(request): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let amount = to_smallest_unit(request.total_amount).map_err(payment_error_to_response)?;

    let order = state
        .orders
        .create(OrderRecord::new(identity.id, amount))
        .await
        .map_err(order_store_error)?;

    info!("Order {} created", order.id);

    Ok((StatusCode::CREATED, Json(order)))
}

/// The caller's orders
#[instrument(skip_all, fields(user_id = %identity.id))]
pub async fn orders_own(
    State(state): State<AppState>,
    Extension(identity): Extension<SanitizedIdentity>,
) -> Result<Json<Vec<OrderRecord>>, ApiError> {
    state
        .orders
        .find_by_user(&identity.id)
        .await
        .map(Json)
        .map_err(order_store_error)
}

/// Create a payment intent for an order
#[instrument(skip(state, request), fields(order_id = %request.order_id))]
pub async fn create_payment_intent(
    State(state): State<AppState>,
    Json(request): Json<CreatePaymentIntentRequest>,
) -> Result<Json<CreatePaymentIntentResponse>, ApiError> {
    let processor = state.payments.as_ref().ok_or_else(payments_disabled)?;

    let amount = to_smallest_unit(request.total_amounts).map_err(payment_error_to_response)?;

    let intent = processor
        .create_payment_intent(amount, &request.order_id)
        .await
        .map_err(payment_error_to_response)?;

    info!("Payment intent {} created", intent.id);

    Ok(Json(CreatePaymentIntentResponse {
        client_secret: intent.client_secret,
    }))
}

/// Payment processor webhook (raw body, signed)
#[instrument(skip_all)]
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new("Missing Stripe-Signature header", 400)),
            )
        })?;

    let processor = state.payments.as_ref().ok_or_else(payments_disabled)?;

    let event = processor
        .verify_webhook(&body, signature)
        .await
        .map_err(payment_error_to_response)?;

    info!(
        "Received webhook: type={:?}, id={}",
        event.event_type, event.event_id
    );

    let handler = OrderPaymentHandler::new(state.orders.clone());
    dispatch_payment_event(&handler, &event)
        .await
        .map_err(payment_error_to_response)?;

    Ok(Json(serde_json::json!({ "received": true })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_errors_use_public_messages() {
        let (status, Json(body)) =
            auth_error_to_response(AuthError::TokenInvalid("expired".into()));
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body.error, "unauthorized");

        let (status, Json(body)) =
            auth_error_to_response(AuthError::LookupFailure("db at 10.0.0.3 down".into()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error, "internal error");
    }

    #[test]
    fn test_provider_detail_is_not_exposed() {
        let (status, Json(body)) = payment_error_to_response(PaymentError::ProviderError {
            provider: "stripe".into(),
            message: "No such customer: cus_123".into(),
        });
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body.error, "internal error");
    }

    #[test]
    fn test_token_cookie() {
        assert_eq!(
            token_cookie("abc", 3600, false),
            "jwt=abc; Path=/; HttpOnly; SameSite=Lax; Max-Age=3600"
        );
        assert!(token_cookie("", 0, true).ends_with("Max-Age=0; Secure"));
    }
}
