pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod gateway;
pub mod handlers;
pub mod migrator;
pub mod models;
pub mod openapi;
pub mod services;

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use sea_orm::{ConnectionTrait, DatabaseConnection};
use serde::Serialize;

use crate::{config::AppConfig, errors::ServiceError, services::AppServices};

/// Shared application state, cheap to clone per request.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: Arc<AppConfig>,
    pub services: AppServices,
}

/// Standard response envelope. Every success body carries `success: true`
/// and `error: false`; error bodies are shaped by [`ServiceError`].
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub message: String,
    pub data: T,
    pub success: bool,
    pub error: bool,
}

impl<T> ApiResponse<T> {
    pub fn with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            message: message.into(),
            data,
            success: true,
            error: false,
        }
    }
}

/// Order API surface, mounted under `/api/order`.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/cash-on-delivery", post(handlers::orders::cash_on_delivery))
        .route("/checkout", post(handlers::payments::checkout))
        .route("/confirm-session", post(handlers::payments::confirm_session))
        .route("/webhook", post(handlers::payments::gateway_webhook))
        .route("/order-list", get(handlers::orders::order_list))
        .route("/cancel/:id", put(handlers::orders::cancel_order))
        .route("/delete/:id", delete(handlers::orders::delete_order))
        .route("/assign", post(handlers::dispatch::assign_order))
        .route("/admin/orders", get(handlers::dispatch::admin_orders))
        .route("/admin/stats", get(handlers::dispatch::admin_stats))
        .route("/agent-orders", get(handlers::dispatch::agent_orders))
        .route("/agent/respond/:id", put(handlers::dispatch::agent_respond))
        .route(
            "/agent/update-status/:id",
            put(handlers::dispatch::update_status),
        )
}

/// Full application router: API routes, health probe, and API docs.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/order", order_routes())
        .route("/health", get(health_check))
        .merge(openapi::swagger_ui())
        .fallback(not_found_handler)
        .with_state(state)
}

/// Liveness and database reachability probe.
async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    state
        .db
        .execute_unprepared("SELECT 1")
        .await
        .map_err(|e| ServiceError::Internal(format!("database unreachable: {e}")))?;

    Ok(Json(serde_json::json!({ "status": "ok" })))
}

/// Fallback for unknown routes, keeping the error envelope uniform.
async fn not_found_handler() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({
            "message": "Route not found",
            "error": true,
            "success": false,
        })),
    )
}
