use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection,
    DatabaseTransaction, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::{
        address, customer, delivery_agent, order,
        order::Entity as OrderEntity,
        order_status_history,
    },
    errors::ServiceError,
    models::{AgentDecision, AgentResponse, AgentStatus, OrderStatus},
    services::orders::{AddressSummary, CustomerSummary, OrderResponse},
};

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct AssignOrderRequest {
    #[serde(alias = "orderId")]
    pub order_id: Uuid,
    #[serde(alias = "agentId")]
    pub agent_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AgentResponseRequest {
    pub decision: AgentDecision,
    #[serde(default, alias = "note")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateProgressRequest {
    pub status: OrderStatus,
    #[serde(default)]
    pub note: Option<String>,
}

/// Filters for the admin order board.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct AdminOrderFilter {
    pub status: Option<OrderStatus>,
    /// When true, only orders in the unassigned pool.
    #[serde(default)]
    pub unassigned: bool,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct AgentOrderFilter {
    pub status: Option<OrderStatus>,
}

/// Aggregate figures for the admin dashboard, folded over every order on
/// record, cancelled ones included.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdminStats {
    pub total_orders: u64,
    pub total_items_sold: u64,
    pub total_income: Decimal,
}

/// Assignment and delivery-progress operations, shared by the admin board
/// and the agent console.
#[derive(Clone)]
pub struct DispatchService {
    db: Arc<DatabaseConnection>,
}

impl DispatchService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Assigns a `PLACED` order to an active agent. The write is conditional
    /// on the order still being `PLACED`, so two admins racing for the same
    /// order produce exactly one assignment.
    #[instrument(skip(self), fields(order_id = %request.order_id, agent_id = %request.agent_id))]
    pub async fn assign(
        &self,
        admin_id: Uuid,
        request: AssignOrderRequest,
    ) -> Result<OrderResponse, ServiceError> {
        let db = &*self.db;

        let agent = delivery_agent::Entity::find_by_id(request.agent_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Delivery agent not found"))?;

        if agent.status != AgentStatus::Active {
            return Err(ServiceError::conflict("Delivery agent is not active"));
        }

        let existing = OrderEntity::find_by_id(request.order_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Order not found"))?;

        if existing.order_status != OrderStatus::Placed {
            return Err(ServiceError::conflict(
                "Only unassigned orders can be assigned",
            ));
        }

        let now = Utc::now();
        let txn = db.begin().await?;

        let update = order::ActiveModel {
            delivery_agent_id: Set(Some(request.agent_id)),
            order_status: Set(OrderStatus::Assigned),
            assigned_at: Set(Some(now)),
            agent_response: Set(AgentResponse::Pending),
            declined_reason: Set(None),
            declined_at: Set(None),
            updated_at: Set(Some(now)),
            ..Default::default()
        };

        let result = OrderEntity::update_many()
            .set(update)
            .col_expr(
                order::Column::Version,
                Expr::col(order::Column::Version).add(1),
            )
            .filter(order::Column::Id.eq(request.order_id))
            .filter(order::Column::OrderStatus.eq(OrderStatus::Placed))
            .exec(&txn)
            .await?;

        if result.rows_affected == 0 {
            return Err(ServiceError::conflict(
                "Only unassigned orders can be assigned",
            ));
        }

        record_history(
            &txn,
            request.order_id,
            "ASSIGNED",
            "Assigned to delivery agent",
            Some(request.agent_id),
        )
        .await?;

        txn.commit().await?;

        info!(
            order_id = %request.order_id,
            agent_id = %request.agent_id,
            admin_id = %admin_id,
            "order assigned"
        );

        self.fetch_order(request.order_id).await
    }

    /// Agent accepts or declines a pending assignment. A decline returns the
    /// order to the unassigned pool with the agent and forward timestamps
    /// cleared; the decline itself stays on the audit trail.
    #[instrument(skip(self, request), fields(order_id = %order_id, agent_id = %agent_id))]
    pub async fn respond(
        &self,
        agent_id: Uuid,
        order_id: Uuid,
        request: AgentResponseRequest,
    ) -> Result<OrderResponse, ServiceError> {
        let db = &*self.db;

        let existing = OrderEntity::find()
            .filter(order::Column::Id.eq(order_id))
            .filter(order::Column::DeliveryAgentId.eq(agent_id))
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Order not found"))?;

        if existing.order_status != OrderStatus::Assigned {
            return Err(ServiceError::conflict(
                "Only assigned orders can be responded to",
            ));
        }

        let now = Utc::now();
        let txn = db.begin().await?;

        let (update, history_status, note) = match request.decision {
            AgentDecision::Accept => (
                order::ActiveModel {
                    agent_response: Set(AgentResponse::Accepted),
                    updated_at: Set(Some(now)),
                    ..Default::default()
                },
                "ACCEPTED",
                "Assignment accepted by delivery agent".to_string(),
            ),
            AgentDecision::Decline => {
                let reason = request.reason.clone().unwrap_or_default();
                (
                    order::ActiveModel {
                        agent_response: Set(AgentResponse::Declined),
                        declined_reason: Set(Some(reason.clone())),
                        declined_at: Set(Some(now)),
                        delivery_agent_id: Set(None),
                        order_status: Set(OrderStatus::Placed),
                        assigned_at: Set(None),
                        picked_up_at: Set(None),
                        out_for_delivery_at: Set(None),
                        delivered_at: Set(None),
                        updated_at: Set(Some(now)),
                        ..Default::default()
                    },
                    "DECLINED",
                    if reason.is_empty() {
                        "Assignment declined by delivery agent".to_string()
                    } else {
                        format!("Assignment declined: {reason}")
                    },
                )
            }
        };

        let result = OrderEntity::update_many()
            .set(update)
            .col_expr(
                order::Column::Version,
                Expr::col(order::Column::Version).add(1),
            )
            .filter(order::Column::Id.eq(order_id))
            .filter(order::Column::DeliveryAgentId.eq(agent_id))
            .filter(order::Column::OrderStatus.eq(OrderStatus::Assigned))
            .exec(&txn)
            .await?;

        if result.rows_affected == 0 {
            return Err(ServiceError::conflict(
                "Only assigned orders can be responded to",
            ));
        }

        record_history(&txn, order_id, history_status, &note, Some(agent_id)).await?;

        txn.commit().await?;

        info!(order_id = %order_id, decision = ?request.decision, "agent responded to assignment");

        self.fetch_order(order_id).await
    }

    /// Advances an order exactly one step along the delivery chain and stamps
    /// the matching timestamp. Skips and regressions are rejected with the
    /// legal next step named.
    #[instrument(skip(self, request), fields(order_id = %order_id, agent_id = %agent_id))]
    pub async fn update_progress(
        &self,
        agent_id: Uuid,
        order_id: Uuid,
        request: UpdateProgressRequest,
    ) -> Result<OrderResponse, ServiceError> {
        let target = request.status;

        if !matches!(
            target,
            OrderStatus::PickedUp | OrderStatus::OutForDelivery | OrderStatus::Delivered
        ) {
            return Err(ServiceError::validation("Invalid status"));
        }

        let db = &*self.db;

        let existing = OrderEntity::find()
            .filter(order::Column::Id.eq(order_id))
            .filter(order::Column::DeliveryAgentId.eq(agent_id))
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Order not found"))?;

        if existing.order_status.is_terminal() {
            return Err(ServiceError::conflict(
                "Order is no longer in delivery",
            ));
        }

        let next = existing
            .order_status
            .next_forward()
            .ok_or_else(|| ServiceError::conflict("Order is not ready for delivery updates"))?;

        if next != target {
            return Err(ServiceError::conflict(format!(
                "Next valid status is {next}"
            )));
        }

        let now = Utc::now();
        let mut update = order::ActiveModel {
            order_status: Set(target),
            updated_at: Set(Some(now)),
            ..Default::default()
        };
        match target {
            OrderStatus::PickedUp => update.picked_up_at = Set(Some(now)),
            OrderStatus::OutForDelivery => update.out_for_delivery_at = Set(Some(now)),
            OrderStatus::Delivered => update.delivered_at = Set(Some(now)),
            _ => {}
        }

        let txn = db.begin().await?;

        let result = OrderEntity::update_many()
            .set(update)
            .col_expr(
                order::Column::Version,
                Expr::col(order::Column::Version).add(1),
            )
            .filter(order::Column::Id.eq(order_id))
            .filter(order::Column::DeliveryAgentId.eq(agent_id))
            .filter(order::Column::OrderStatus.eq(existing.order_status))
            .exec(&txn)
            .await?;

        if result.rows_affected == 0 {
            return Err(ServiceError::conflict(
                "Order status changed concurrently, retry",
            ));
        }

        let note = request
            .note
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| "Delivery progress updated".to_string());
        record_history(&txn, order_id, &target.to_string(), &note, Some(agent_id)).await?;

        txn.commit().await?;

        info!(order_id = %order_id, status = %target, "delivery progress updated");

        self.fetch_order(order_id).await
    }

    /// Admin board: every order, newest first, optionally narrowed to one
    /// status or to the unassigned pool. Customer and address summaries are
    /// attached in one batch each.
    #[instrument(skip(self))]
    pub async fn admin_orders(
        &self,
        filter: AdminOrderFilter,
    ) -> Result<Vec<OrderResponse>, ServiceError> {
        let mut query = OrderEntity::find().order_by_desc(order::Column::CreatedAt);

        if let Some(status) = filter.status {
            query = query.filter(order::Column::OrderStatus.eq(status));
        }
        if filter.unassigned {
            query = query
                .filter(order::Column::OrderStatus.eq(OrderStatus::Placed))
                .filter(order::Column::DeliveryAgentId.is_null());
        }

        let rows = query.all(&*self.db).await?;
        self.attach_parties(rows).await
    }

    /// Agent console: the agent's own orders, in-delivery statuses by
    /// default, declined assignments excluded.
    #[instrument(skip(self), fields(agent_id = %agent_id))]
    pub async fn agent_orders(
        &self,
        agent_id: Uuid,
        filter: AgentOrderFilter,
    ) -> Result<Vec<OrderResponse>, ServiceError> {
        let status_condition = match filter.status {
            Some(status) => Condition::all().add(order::Column::OrderStatus.eq(status)),
            None => Condition::all()
                .add(order::Column::OrderStatus.is_in(OrderStatus::agent_visible())),
        };

        let rows = OrderEntity::find()
            .filter(order::Column::DeliveryAgentId.eq(agent_id))
            .filter(status_condition)
            .filter(order::Column::AgentResponse.ne(AgentResponse::Declined))
            .order_by_desc(order::Column::CreatedAt)
            .all(&*self.db)
            .await?;

        self.attach_parties(rows).await
    }

    /// Dashboard totals, folded in memory over the full order set.
    #[instrument(skip(self))]
    pub async fn admin_stats(&self) -> Result<AdminStats, ServiceError> {
        let rows = OrderEntity::find().all(&*self.db).await?;

        let mut stats = AdminStats {
            total_orders: rows.len() as u64,
            total_items_sold: 0,
            total_income: Decimal::ZERO,
        };

        for row in &rows {
            stats.total_items_sold += row.quantity.max(0) as u64;
            stats.total_income += row.total;
        }

        Ok(stats)
    }

    async fn attach_parties(
        &self,
        rows: Vec<order::Model>,
    ) -> Result<Vec<OrderResponse>, ServiceError> {
        let address_ids: Vec<Uuid> = rows.iter().map(|o| o.delivery_address_id).collect();
        let customer_ids: Vec<Uuid> = rows.iter().map(|o| o.customer_id).collect();

        let addresses: HashMap<Uuid, address::Model> = address::Entity::find()
            .filter(address::Column::Id.is_in(address_ids))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|a| (a.id, a))
            .collect();

        let customers: HashMap<Uuid, customer::Model> = customer::Entity::find()
            .filter(customer::Column::Id.is_in(customer_ids))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();

        Ok(rows
            .into_iter()
            .map(|model| {
                let address = addresses.get(&model.delivery_address_id).cloned();
                let buyer = customers.get(&model.customer_id).cloned();
                let mut response = OrderResponse::from(model);
                response.delivery_address = address.map(AddressSummary::from);
                response.customer = buyer.map(CustomerSummary::from);
                response
            })
            .collect())
    }

    async fn fetch_order(&self, order_id: Uuid) -> Result<OrderResponse, ServiceError> {
        OrderEntity::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .map(OrderResponse::from)
            .ok_or_else(|| ServiceError::not_found("Order not found"))
    }
}

async fn record_history(
    txn: &DatabaseTransaction,
    order_id: Uuid,
    status: &str,
    note: &str,
    actor_id: Option<Uuid>,
) -> Result<(), ServiceError> {
    order_status_history::ActiveModel {
        id: Set(Uuid::new_v4()),
        order_id: Set(order_id),
        status: Set(status.to_string()),
        note: Set(note.to_string()),
        actor_id: Set(actor_id),
        recorded_at: Set(Utc::now()),
    }
    .insert(txn)
    .await?;
    Ok(())
}
