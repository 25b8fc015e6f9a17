use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::{
        address, cart_item, customer, order,
        order::{generate_order_number, Entity as OrderEntity},
        order_status_history,
    },
    errors::ServiceError,
    models::{pricing, AgentResponse, OrderStatus},
};

pub const PAYMENT_STATUS_COD: &str = "CASH ON DELIVERY";

/// One cart line submitted at checkout, carrying the product snapshot the
/// order record will keep forever.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CheckoutLine {
    #[serde(alias = "productId")]
    pub product_id: Uuid,
    #[validate(length(min = 1, message = "Product name is required"))]
    pub name: String,
    #[serde(default, alias = "image")]
    pub images: Vec<String>,
    pub price: Decimal,
    #[serde(default, alias = "discount")]
    pub discount_percent: u32,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

/// Checkout request body, shared by the cash-on-delivery and card flows.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateOrderRequest {
    #[serde(alias = "list_items")]
    #[validate(length(min = 1, message = "Cart is empty"))]
    pub items: Vec<CheckoutLine>,
    #[serde(alias = "addressId")]
    pub address_id: Uuid,
    /// Client-side display totals; the server always reprices.
    #[serde(default, alias = "subTotalAmt")]
    pub sub_total: Option<Decimal>,
    #[serde(default, alias = "totalAmt")]
    pub total: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AddressSummary {
    pub id: Uuid,
    pub address_line: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub country: String,
    pub mobile: Option<String>,
}

impl From<address::Model> for AddressSummary {
    fn from(model: address::Model) -> Self {
        Self {
            id: model.id,
            address_line: model.address_line,
            city: model.city,
            state: model.state,
            pincode: model.pincode,
            country: model.country,
            mobile: model.mobile,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CustomerSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub mobile: Option<String>,
}

impl From<customer::Model> for CustomerSummary {
    fn from(model: customer::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            mobile: model.mobile,
        }
    }
}

/// Order record as returned to clients. `delivery_address` and `customer`
/// are resolved by the list queries that need them and absent elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub order_number: String,
    pub customer_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub product_images: Vec<String>,
    pub quantity: i32,
    pub payment_id: String,
    pub payment_status: String,
    pub delivery_address_id: Uuid,
    pub sub_total: Decimal,
    pub total: Decimal,
    pub order_status: OrderStatus,
    pub cancel_reason: Option<String>,
    pub canceled_at: Option<DateTime<Utc>>,
    pub delivery_agent_id: Option<Uuid>,
    pub agent_response: AgentResponse,
    pub declined_reason: Option<String>,
    pub declined_at: Option<DateTime<Utc>>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub picked_up_at: Option<DateTime<Utc>>,
    pub out_for_delivery_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_address: Option<AddressSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<CustomerSummary>,
}

impl From<order::Model> for OrderResponse {
    fn from(model: order::Model) -> Self {
        let product_images =
            serde_json::from_value(model.product_images.clone()).unwrap_or_default();
        Self {
            id: model.id,
            order_number: model.order_number,
            customer_id: model.customer_id,
            product_id: model.product_id,
            product_name: model.product_name,
            product_images,
            quantity: model.quantity,
            payment_id: model.payment_id,
            payment_status: model.payment_status,
            delivery_address_id: model.delivery_address_id,
            sub_total: model.sub_total,
            total: model.total,
            order_status: model.order_status,
            cancel_reason: model.cancel_reason,
            canceled_at: model.canceled_at,
            delivery_agent_id: model.delivery_agent_id,
            agent_response: model.agent_response,
            declined_reason: model.declined_reason,
            declined_at: model.declined_at,
            assigned_at: model.assigned_at,
            picked_up_at: model.picked_up_at,
            out_for_delivery_at: model.out_for_delivery_at,
            delivered_at: model.delivered_at,
            created_at: model.created_at,
            delivery_address: None,
            customer: None,
        }
    }
}

/// Service for customer-facing order operations: cash-on-delivery creation,
/// listing, cancellation, and deletion.
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
}

impl OrderService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Creates one order record per cart line, all inside one transaction,
    /// then clears the customer's cart best-effort.
    #[instrument(skip(self, request), fields(customer_id = %customer_id, lines = request.items.len()))]
    pub async fn create_cash_on_delivery(
        &self,
        customer_id: Uuid,
        request: CreateOrderRequest,
    ) -> Result<Vec<OrderResponse>, ServiceError> {
        request.validate()?;
        validate_lines(&request.items)?;

        let db = &*self.db;
        let now = Utc::now();

        let txn = db.begin().await?;

        let mut created = Vec::with_capacity(request.items.len());
        for line in &request.items {
            let sub_total = pricing::line_total(line.price, line.discount_percent, line.quantity);

            let model = order::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_number: Set(generate_order_number()),
                customer_id: Set(customer_id),
                product_id: Set(line.product_id),
                product_name: Set(line.name.clone()),
                product_images: Set(json!(line.images)),
                quantity: Set(line.quantity as i32),
                payment_id: Set(String::new()),
                payment_status: Set(PAYMENT_STATUS_COD.to_string()),
                delivery_address_id: Set(request.address_id),
                sub_total: Set(sub_total),
                total: Set(sub_total),
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
            customer_id = %customer_id,
            orders = created.len(),
            "cash-on-delivery order placed"
        );

        // Orders are committed; a cart-clearing failure is logged, never
        // surfaced, and never rolls the orders back.
        if let Err(e) = clear_customer_cart(db, customer_id).await {
            error!(customer_id = %customer_id, error = %e, "cart clearing failed after order creation");
        }

        Ok(created.into_iter().map(OrderResponse::from).collect())
    }

    /// Customer's own orders, newest first, delivery address resolved.
    #[instrument(skip(self), fields(customer_id = %customer_id))]
    pub async fn list_for_customer(
        &self,
        customer_id: Uuid,
    ) -> Result<Vec<OrderResponse>, ServiceError> {
        let rows = OrderEntity::find()
            .filter(order::Column::CustomerId.eq(customer_id))
            .order_by_desc(order::Column::CreatedAt)
            .find_also_related(address::Entity)
            .all(&*self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(model, addr)| {
                let mut response = OrderResponse::from(model);
                response.delivery_address = addr.map(AddressSummary::from);
                response
            })
            .collect())
    }

    /// Resolves an order reference that may be a UUID or an order number.
    pub async fn resolve_order_ref(&self, reference: &str) -> Result<Uuid, ServiceError> {
        if let Ok(id) = Uuid::parse_str(reference) {
            return Ok(id);
        }

        OrderEntity::find()
            .filter(order::Column::OrderNumber.eq(reference))
            .one(&*self.db)
            .await?
            .map(|model| model.id)
            .ok_or_else(|| ServiceError::not_found("Order not found"))
    }

    /// Cancels an order on behalf of its owner. Assignment state and history
    /// are left untouched; the record simply leaves the active pool.
    #[instrument(skip(self), fields(customer_id = %customer_id, order_id = %order_id))]
    pub async fn cancel(
        &self,
        customer_id: Uuid,
        order_id: Uuid,
        reason: Option<String>,
    ) -> Result<OrderResponse, ServiceError> {
        let db = &*self.db;

        let existing = OrderEntity::find()
            .filter(order::Column::Id.eq(order_id))
            .filter(order::Column::CustomerId.eq(customer_id))
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Order not found"))?;

        match existing.order_status {
            OrderStatus::Cancelled => {
                return Err(ServiceError::conflict("Order already cancelled"))
            }
            OrderStatus::Delivered => {
                return Err(ServiceError::conflict("Delivered order cannot be cancelled"))
            }
            _ => {}
        }

        let now = Utc::now();
        let update = order::ActiveModel {
            order_status: Set(OrderStatus::Cancelled),
            cancel_reason: Set(Some(reason.unwrap_or_default())),
            canceled_at: Set(Some(now)),
            updated_at: Set(Some(now)),
            ..Default::default()
        };

        // Conditional write: a concurrent transition between the read above
        // and this update makes it a no-op instead of a lost update.
        let result = OrderEntity::update_many()
            .set(update)
            .col_expr(
                order::Column::Version,
                Expr::col(order::Column::Version).add(1),
            )
            .filter(order::Column::Id.eq(order_id))
            .filter(order::Column::OrderStatus.eq(existing.order_status))
            .exec(db)
            .await?;

        if result.rows_affected == 0 {
            return Err(ServiceError::conflict("Order can no longer be cancelled"));
        }

        info!(order_id = %order_id, "order cancelled");

        self.fetch_order(order_id).await
    }

    /// Permanently deletes a cancelled order and its history. Active orders
    /// are never deleted.
    #[instrument(skip(self), fields(customer_id = %customer_id, order_id = %order_id))]
    pub async fn delete(&self, customer_id: Uuid, order_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db;

        let existing = OrderEntity::find()
            .filter(order::Column::Id.eq(order_id))
            .filter(order::Column::CustomerId.eq(customer_id))
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Order not found"))?;

        if existing.order_status != OrderStatus::Cancelled {
            return Err(ServiceError::conflict(
                "Only cancelled orders can be deleted",
            ));
        }

        let txn = db.begin().await?;

        order_status_history::Entity::delete_many()
            .filter(order_status_history::Column::OrderId.eq(order_id))
            .exec(&txn)
            .await?;

        let result = OrderEntity::delete_many()
            .filter(order::Column::Id.eq(order_id))
            .filter(order::Column::CustomerId.eq(customer_id))
            .filter(order::Column::OrderStatus.eq(OrderStatus::Cancelled))
            .exec(&txn)
            .await?;

        if result.rows_affected == 0 {
            return Err(ServiceError::conflict("Order can no longer be deleted"));
        }

        txn.commit().await?;

        info!(order_id = %order_id, "cancelled order deleted");

        Ok(())
    }

    async fn fetch_order(&self, order_id: Uuid) -> Result<OrderResponse, ServiceError> {
        OrderEntity::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .map(OrderResponse::from)
            .ok_or_else(|| ServiceError::not_found("Order not found"))
    }
}

pub(crate) fn validate_lines(lines: &[CheckoutLine]) -> Result<(), ServiceError> {
    for line in lines {
        if line.price <= Decimal::ZERO {
            return Err(ServiceError::validation(format!(
                "Cart line {} has no valid price",
                line.product_id
            )));
        }
        if line.quantity == 0 {
            return Err(ServiceError::validation(format!(
                "Cart line {} has zero quantity",
                line.product_id
            )));
        }
        if line.discount_percent > 100 {
            return Err(ServiceError::validation(format!(
                "Cart line {} has an invalid discount",
                line.product_id
            )));
        }
    }
    Ok(())
}

/// Empties the customer's cart after a successful checkout: the cart rows
/// and the denormalized snapshot on the profile.
///
/// Runs after orders are committed; callers treat failures as retryable
/// cleanup, never as order failure.
pub(crate) async fn clear_customer_cart(
    db: &DatabaseConnection,
    customer_id: Uuid,
) -> Result<(), ServiceError> {
    let removed = cart_item::Entity::delete_many()
        .filter(cart_item::Column::CustomerId.eq(customer_id))
        .exec(db)
        .await?;

    let reset = customer::Entity::update_many()
        .col_expr(customer::Column::CartSnapshot, Expr::value(json!([])))
        .filter(customer::Column::Id.eq(customer_id))
        .exec(db)
        .await?;

    if reset.rows_affected == 0 {
        warn!(customer_id = %customer_id, "cart snapshot reset matched no customer row");
    }

    info!(
        customer_id = %customer_id,
        cart_lines_removed = removed.rows_affected,
        "cart cleared"
    );

    Ok(())
}
