use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    Json,
};
use serde_json::json;

use crate::{
    auth::CustomerAuth,
    errors::ServiceError,
    services::orders::{CreateOrderRequest, OrderResponse},
    services::reconciliation::{CheckoutSessionResponse, ConfirmSessionRequest},
    ApiResponse, AppState,
};

/// Create a hosted card-checkout session for the customer's cart.
#[utoipa::path(
    post,
    path = "/api/order/checkout",
    request_body = CreateOrderRequest,
    responses(
        (status = 200, description = "Checkout session created"),
        (status = 400, description = "Invalid cart"),
        (status = 502, description = "Payment gateway unavailable")
    ),
    security(("bearer_auth" = [])),
    tag = "payments"
)]
pub async fn checkout(
    State(state): State<AppState>,
    auth: CustomerAuth,
    Json(request): Json<CreateOrderRequest>,
) -> Result<Json<ApiResponse<CheckoutSessionResponse>>, ServiceError> {
    let session = state
        .services
        .reconciliation
        .create_checkout_session(auth.customer_id, request)
        .await?;
    Ok(Json(ApiResponse::with_message(
        "Checkout session created",
        session,
    )))
}

/// Confirm a checkout session after the success redirect. Idempotent with
/// the webhook path: whichever arrives second gets the existing orders back.
#[utoipa::path(
    post,
    path = "/api/order/confirm-session",
    request_body = ConfirmSessionRequest,
    responses(
        (status = 200, description = "Session reconciled into orders"),
        (status = 409, description = "Payment not completed"),
        (status = 502, description = "Payment gateway unavailable")
    ),
    security(("bearer_auth" = [])),
    tag = "payments"
)]
pub async fn confirm_session(
    State(state): State<AppState>,
    auth: CustomerAuth,
    Json(request): Json<ConfirmSessionRequest>,
) -> Result<Json<ApiResponse<Vec<OrderResponse>>>, ServiceError> {
    let orders = state
        .services
        .reconciliation
        .confirm_session(auth.customer_id, request)
        .await?;
    Ok(Json(ApiResponse::with_message("Payment confirmed", orders)))
}

/// Payment gateway webhook receiver. Authenticated by signature, not by
/// bearer token; the raw body is needed for verification.
#[utoipa::path(
    post,
    path = "/api/order/webhook",
    request_body(content = Vec<u8>, content_type = "application/json"),
    responses(
        (status = 200, description = "Event processed or ignored"),
        (status = 400, description = "Malformed event payload"),
        (status = 401, description = "Signature verification failed")
    ),
    tag = "payments"
)]
pub async fn gateway_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ServiceError> {
    state
        .services
        .reconciliation
        .handle_webhook(&headers, &body)
        .await?;
    Ok(Json(json!({ "received": true })))
}
