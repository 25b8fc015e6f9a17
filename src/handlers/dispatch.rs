use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::{
    auth::{AdminAuth, AgentAuth},
    errors::ServiceError,
    services::dispatch::{
        AdminOrderFilter, AdminStats, AgentOrderFilter, AgentResponseRequest, AssignOrderRequest,
        UpdateProgressRequest,
    },
    services::orders::OrderResponse,
    ApiResponse, AppState,
};

/// Assign an order to a delivery agent.
#[utoipa::path(
    post,
    path = "/api/order/assign",
    request_body = AssignOrderRequest,
    responses(
        (status = 200, description = "Order assigned"),
        (status = 404, description = "Order or agent not found"),
        (status = 409, description = "Order not assignable or agent inactive")
    ),
    security(("bearer_auth" = [])),
    tag = "dispatch"
)]
pub async fn assign_order(
    State(state): State<AppState>,
    auth: AdminAuth,
    Json(request): Json<AssignOrderRequest>,
) -> Result<Json<ApiResponse<OrderResponse>>, ServiceError> {
    let order = state
        .services
        .dispatch
        .assign(auth.admin_id, request)
        .await?;
    Ok(Json(ApiResponse::with_message("Order assigned", order)))
}

/// Full order board for administrators.
#[utoipa::path(
    get,
    path = "/api/order/admin/orders",
    params(
        ("status" = Option<String>, Query, description = "Filter by order status"),
        ("unassigned" = Option<bool>, Query, description = "Only the unassigned pool")
    ),
    responses((status = 200, description = "All orders")),
    security(("bearer_auth" = [])),
    tag = "dispatch"
)]
pub async fn admin_orders(
    State(state): State<AppState>,
    _auth: AdminAuth,
    Query(filter): Query<AdminOrderFilter>,
) -> Result<Json<ApiResponse<Vec<OrderResponse>>>, ServiceError> {
    let orders = state.services.dispatch.admin_orders(filter).await?;
    Ok(Json(ApiResponse::with_message("Order list", orders)))
}

/// Aggregate dashboard figures.
#[utoipa::path(
    get,
    path = "/api/order/admin/stats",
    responses((status = 200, description = "Dashboard totals")),
    security(("bearer_auth" = [])),
    tag = "dispatch"
)]
pub async fn admin_stats(
    State(state): State<AppState>,
    _auth: AdminAuth,
) -> Result<Json<ApiResponse<AdminStats>>, ServiceError> {
    let stats = state.services.dispatch.admin_stats().await?;
    Ok(Json(ApiResponse::with_message("Dashboard stats", stats)))
}

/// Orders assigned to the authenticated agent.
#[utoipa::path(
    get,
    path = "/api/order/agent-orders",
    params(("status" = Option<String>, Query, description = "Filter by order status")),
    responses((status = 200, description = "Agent's orders")),
    security(("bearer_auth" = [])),
    tag = "dispatch"
)]
pub async fn agent_orders(
    State(state): State<AppState>,
    auth: AgentAuth,
    Query(filter): Query<AgentOrderFilter>,
) -> Result<Json<ApiResponse<Vec<OrderResponse>>>, ServiceError> {
    let orders = state
        .services
        .dispatch
        .agent_orders(auth.agent_id, filter)
        .await?;
    Ok(Json(ApiResponse::with_message("Order list", orders)))
}

/// Accept or decline a pending assignment.
#[utoipa::path(
    put,
    path = "/api/order/agent/respond/{id}",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = AgentResponseRequest,
    responses(
        (status = 200, description = "Response recorded"),
        (status = 404, description = "Order not found for this agent"),
        (status = 409, description = "Order is not awaiting a response")
    ),
    security(("bearer_auth" = [])),
    tag = "dispatch"
)]
pub async fn agent_respond(
    State(state): State<AppState>,
    auth: AgentAuth,
    Path(id): Path<Uuid>,
    Json(request): Json<AgentResponseRequest>,
) -> Result<Json<ApiResponse<OrderResponse>>, ServiceError> {
    let order = state
        .services
        .dispatch
        .respond(auth.agent_id, id, request)
        .await?;
    Ok(Json(ApiResponse::with_message("Response recorded", order)))
}

/// Advance delivery progress one step.
#[utoipa::path(
    put,
    path = "/api/order/agent/update-status/{id}",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = UpdateProgressRequest,
    responses(
        (status = 200, description = "Status updated"),
        (status = 400, description = "Status is not a delivery step"),
        (status = 409, description = "Step is not the legal next one")
    ),
    security(("bearer_auth" = [])),
    tag = "dispatch"
)]
pub async fn update_status(
    State(state): State<AppState>,
    auth: AgentAuth,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateProgressRequest>,
) -> Result<Json<ApiResponse<OrderResponse>>, ServiceError> {
    let order = state
        .services
        .dispatch
        .update_progress(auth.agent_id, id, request)
        .await?;
    Ok(Json(ApiResponse::with_message("Order status updated", order)))
}
