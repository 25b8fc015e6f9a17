use std::sync::Arc;

use chrono::Utc;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::AppConfig,
    entities::{
        customer, order,
        order::{generate_order_number, Entity as OrderEntity},
    },
    errors::ServiceError,
    gateway::{
        webhook, CheckoutSession, CreateSessionLineItem, CreateSessionRequest, PaymentGateway,
        SessionMetadata,
    },
    models::{pricing, AgentResponse, OrderStatus},
    services::orders::{clear_customer_cart, validate_lines, CreateOrderRequest, OrderResponse},
};

pub const PAYMENT_STATUS_PAID: &str = "paid";

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CheckoutSessionResponse {
    pub session_id: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ConfirmSessionRequest {
    #[serde(alias = "sessionId")]
    #[validate(length(min = 1, message = "Session id is required"))]
    pub session_id: String,
}

/// Turns paid gateway sessions into order rows, exactly once.
///
/// Two paths race for the same session: the gateway's webhook push and the
/// client's confirm poll after redirect. Both funnel into
/// [`Self::reconcile_session`], which keys on the session's payment id and
/// returns the already-persisted rows when the other path got there first.
#[derive(Clone)]
pub struct ReconciliationService {
    db: Arc<DatabaseConnection>,
    gateway: Arc<dyn PaymentGateway>,
    config: Arc<AppConfig>,
}

impl ReconciliationService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        gateway: Arc<dyn PaymentGateway>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            db,
            gateway,
            config,
        }
    }

    /// Creates a hosted checkout session for the customer's cart. No order
    /// rows exist until the session is reconciled as paid.
    #[instrument(skip(self, request), fields(customer_id = %customer_id, lines = request.items.len()))]
    pub async fn create_checkout_session(
        &self,
        customer_id: Uuid,
        request: CreateOrderRequest,
    ) -> Result<CheckoutSessionResponse, ServiceError> {
        request.validate()?;
        validate_lines(&request.items)?;

        let buyer = customer::Entity::find_by_id(customer_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Customer not found"))?;

        let line_items = request
            .items
            .iter()
            .map(|line| {
                let unit = pricing::discounted_unit_price(line.price, line.discount_percent);
                let unit_amount_minor = (unit * Decimal::from(100))
                    .to_i64()
                    .ok_or_else(|| ServiceError::validation("Line price out of range"))?;
                Ok(CreateSessionLineItem {
                    product_id: line.product_id,
                    name: line.name.clone(),
                    images: line.images.clone(),
                    unit_amount_minor,
                    quantity: line.quantity,
                })
            })
            .collect::<Result<Vec<_>, ServiceError>>()?;

        let frontend = self.config.frontend_url.trim_end_matches('/');
        let session = self
            .gateway
            .create_checkout_session(CreateSessionRequest {
                customer_email: buyer.email,
                currency: self.config.currency.clone(),
                metadata: SessionMetadata {
                    customer_id,
                    address_id: request.address_id,
                },
                success_url: format!("{frontend}/success?session_id={{CHECKOUT_SESSION_ID}}"),
                cancel_url: format!("{frontend}/cancel"),
                line_items,
            })
            .await?;

        info!(customer_id = %customer_id, session_id = %session.id, "checkout session created");

        Ok(CheckoutSessionResponse {
            session_id: session.id,
            url: session.url,
        })
    }

    /// Client-poll path: fetch the session the customer was redirected back
    /// from and reconcile it. An unpaid session is a conflict, not an error
    /// in the request itself.
    #[instrument(skip(self, request), fields(customer_id = %customer_id))]
    pub async fn confirm_session(
        &self,
        customer_id: Uuid,
        request: ConfirmSessionRequest,
    ) -> Result<Vec<OrderResponse>, ServiceError> {
        request.validate()?;

        let session = self.gateway.retrieve_session(&request.session_id).await?;

        if !session.is_paid() {
            return Err(ServiceError::conflict("Payment not completed"));
        }

        let orders = self.reconcile_session(&session).await?;

        if orders.iter().any(|o| o.customer_id != customer_id) {
            warn!(
                customer_id = %customer_id,
                session_id = %session.id,
                "confirm attempted against another customer's session"
            );
            return Err(ServiceError::not_found("Order not found"));
        }

        Ok(orders)
    }

    /// Gateway-push path. Verifies the event signature when a webhook secret
    /// is configured, then reconciles `checkout.session.completed` events.
    /// Other event types are acknowledged and ignored.
    #[instrument(skip(self, headers, payload))]
    pub async fn handle_webhook(
        &self,
        headers: &axum::http::HeaderMap,
        payload: &[u8],
    ) -> Result<(), ServiceError> {
        if let Some(secret) = &self.config.gateway_webhook_secret {
            if !webhook::verify_signature(
                headers,
                payload,
                secret,
                self.config.gateway_webhook_tolerance_secs,
            ) {
                warn!("webhook rejected: signature verification failed");
                return Err(ServiceError::Unauthorized(
                    "Invalid webhook signature".to_string(),
                ));
            }
        }

        let event: serde_json::Value = serde_json::from_slice(payload)
            .map_err(|e| ServiceError::validation(format!("Malformed webhook payload: {e}")))?;

        let event_type = event["type"].as_str().unwrap_or("");
        if event_type != "checkout.session.completed" {
            info!(event_type, "webhook event ignored");
            return Ok(());
        }

        let session = crate::gateway::stripe::session_from_value(&event["data"]["object"])?;
        let orders = self.reconcile_session(&session).await?;

        info!(
            session_id = %session.id,
            orders = orders.len(),
            "webhook reconciled checkout session"
        );

        Ok(())
    }

    /// Persists the orders for a paid session, or returns the rows a prior
    /// reconciliation already wrote. Idempotency keys on the session's
    /// payment id, which every row of the batch shares.
    pub async fn reconcile_session(
        &self,
        session: &CheckoutSession,
    ) -> Result<Vec<OrderResponse>, ServiceError> {
        let payment_id = session.payment_intent.as_deref().ok_or_else(|| {
            ServiceError::Upstream("paid session carries no payment id".to_string())
        })?;

        // Fast path: the other reconciliation path already persisted this
        // payment.
        let existing = OrderEntity::find()
            .filter(order::Column::PaymentId.eq(payment_id))
            .all(&*self.db)
            .await?;
        if !existing.is_empty() {
            info!(payment_id, "payment already reconciled");
            return Ok(existing.into_iter().map(OrderResponse::from).collect());
        }

        let metadata = session.metadata.as_ref().ok_or_else(|| {
            ServiceError::Upstream("session payload missing checkout metadata".to_string())
        })?;

        let line_items = self.gateway.list_line_items(&session.id).await?;
        if line_items.is_empty() {
            return Err(ServiceError::Upstream(
                "paid session has no line items".to_string(),
            ));
        }

        let now = Utc::now();
        let txn = self.db.begin().await?;

        // Re-check inside the transaction so two concurrent reconciliations
        // of the same payment cannot both insert.
        let raced = OrderEntity::find()
            .filter(order::Column::PaymentId.eq(payment_id))
            .all(&txn)
            .await?;
        if !raced.is_empty() {
            txn.commit().await?;
            return Ok(raced.into_iter().map(OrderResponse::from).collect());
        }

        let mut created = Vec::with_capacity(line_items.len());
        for item in &line_items {
            let total = Decimal::new(item.amount_total_minor, 2);

            let model = order::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_number: Set(generate_order_number()),
                customer_id: Set(metadata.customer_id),
                product_id: Set(item.product_id),
                product_name: Set(item.product_name.clone()),
                product_images: Set(json!(item.product_images)),
                quantity: Set(item.quantity),
                payment_id: Set(payment_id.to_string()),
                payment_status: Set(session.payment_status.clone()),
                delivery_address_id: Set(metadata.address_id),
                sub_total: Set(total),
                total: Set(total),
                order_status: Set(OrderStatus::Placed),
                cancel_reason: Set(None),
                canceled_at: Set(None),
                delivery_agent_id: Set(None),
                agent_response: Set(AgentResponse::Pending),
                declined_reason: Set(None),
                declined_at: Set(None),
                assigned_at: Set(None),
                picked_up_at: Set(None),
                out_for_delivery_at: Set(None),
                delivered_at: Set(None),
                created_at: Set(now),
                updated_at: Set(Some(now)),
                version: Set(1),
            }
            .insert(&txn)
            .await?;

            created.push(model);
        }

        txn.commit().await?;

        info!(
            payment_id,
            customer_id = %metadata.customer_id,
            orders = created.len(),
            "paid session reconciled into orders"
        );

        if let Err(e) = clear_customer_cart(&self.db, metadata.customer_id).await {
            error!(
                customer_id = %metadata.customer_id,
                error = %e,
                "cart clearing failed after reconciliation"
            );
        }

        Ok(created.into_iter().map(OrderResponse::from).collect())
    }
}
