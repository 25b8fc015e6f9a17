use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    auth::CustomerAuth,
    errors::ServiceError,
    services::orders::{CreateOrderRequest, OrderResponse},
    ApiResponse, AppState,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CancelOrderRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

/// Place a cash-on-delivery order for the authenticated customer's cart.
#[utoipa::path(
    post,
    path = "/api/order/cash-on-delivery",
    request_body = CreateOrderRequest,
    responses(
        (status = 200, description = "Orders placed"),
        (status = 400, description = "Invalid cart"),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = [])),
    tag = "orders"
)]
pub async fn cash_on_delivery(
    State(state): State<AppState>,
    auth: CustomerAuth,
    Json(request): Json<CreateOrderRequest>,
) -> Result<Json<ApiResponse<Vec<OrderResponse>>>, ServiceError> {
    let orders = state
        .services
        .orders
        .create_cash_on_delivery(auth.customer_id, request)
        .await?;
    Ok(Json(ApiResponse::with_message("Order placed", orders)))
}

/// List the authenticated customer's orders, newest first.
#[utoipa::path(
    get,
    path = "/api/order/order-list",
    responses(
        (status = 200, description = "Customer's orders"),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = [])),
    tag = "orders"
)]
pub async fn order_list(
    State(state): State<AppState>,
    auth: CustomerAuth,
) -> Result<Json<ApiResponse<Vec<OrderResponse>>>, ServiceError> {
    let orders = state
        .services
        .orders
        .list_for_customer(auth.customer_id)
        .await?;
    Ok(Json(ApiResponse::with_message("Order list", orders)))
}

/// Cancel one of the customer's own orders. The path segment accepts either
/// the order UUID or the human-readable order number.
#[utoipa::path(
    put,
    path = "/api/order/cancel/{id}",
    params(("id" = String, Path, description = "Order id or order number")),
    request_body = CancelOrderRequest,
    responses(
        (status = 200, description = "Order cancelled"),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Order already terminal")
    ),
    security(("bearer_auth" = [])),
    tag = "orders"
)]
pub async fn cancel_order(
    State(state): State<AppState>,
    auth: CustomerAuth,
    Path(id): Path<String>,
    Json(request): Json<CancelOrderRequest>,
) -> Result<Json<ApiResponse<OrderResponse>>, ServiceError> {
    let order_id = state.services.orders.resolve_order_ref(&id).await?;
    let order = state
        .services
        .orders
        .cancel(auth.customer_id, order_id, request.reason)
        .await?;
    Ok(Json(ApiResponse::with_message("Order cancelled", order)))
}

/// Delete a cancelled order permanently.
#[utoipa::path(
    delete,
    path = "/api/order/delete/{id}",
    params(("id" = String, Path, description = "Order id or order number")),
    responses(
        (status = 200, description = "Order deleted"),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Order is not cancelled")
    ),
    security(("bearer_auth" = [])),
    tag = "orders"
)]
pub async fn delete_order(
    State(state): State<AppState>,
    auth: CustomerAuth,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ServiceError> {
    let order_id = state.services.orders.resolve_order_ref(&id).await?;
    state
        .services
        .orders
        .delete(auth.customer_id, order_id)
        .await?;
    Ok(Json(ApiResponse::with_message("Order deleted", ())))
}
