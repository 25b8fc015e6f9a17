use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{AgentResponse, OrderStatus};

/// One order record: a single line item of a checkout and its full lifecycle
/// state. A multi-item checkout produces one row per cart line, sharing a
/// creation moment but each carrying its own `order_number`.
///
/// `product_name` and `product_images` are copied from the catalog at order
/// time so that later catalog edits never rewrite order history. `sub_total`
/// and `total` are computed once at creation and never recomputed.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Human-referenceable identifier, `ORD-<hex>`, unique-indexed.
    pub order_number: String,

    pub customer_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    #[sea_orm(column_type = "Json")]
    pub product_images: Json,
    pub quantity: i32,

    /// Gateway payment correlation; empty for cash on delivery.
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
    pub updated_at: Option<DateTime<Utc>>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::customer::Entity",
        from = "Column::CustomerId",
        to = "super::customer::Column::Id"
    )]
    Customer,
    #[sea_orm(
        belongs_to = "super::address::Entity",
        from = "Column::DeliveryAddressId",
        to = "super::address::Column::Id"
    )]
    Address,
    #[sea_orm(
        belongs_to = "super::delivery_agent::Entity",
        from = "Column::DeliveryAgentId",
        to = "super::delivery_agent::Column::Id"
    )]
    DeliveryAgent,
    #[sea_orm(has_many = "super::order_status_history::Entity")]
    StatusHistory,
}

impl Related<super::customer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
    }
}

impl Related<super::address::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Address.def()
    }
}

impl Related<super::delivery_agent::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DeliveryAgent.def()
    }
}

impl Related<super::order_status_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StatusHistory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Generates a fresh human-referenceable order number.
pub fn generate_order_number() -> String {
    format!("ORD-{}", Uuid::new_v4().simple())
}
