use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Lifecycle state of an order record.
///
/// Transitions are monotonic along the forward chain
/// `PLACED -> ASSIGNED -> PICKED_UP -> OUT_FOR_DELIVERY -> DELIVERED`, with
/// `CANCELLED` reachable from any non-terminal state. The single exception is
/// the decline reset, which returns an `ASSIGNED` order to `PLACED`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
    strum::Display,
    strum::EnumString,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[sea_orm(string_value = "PLACED")]
    Placed,
    #[sea_orm(string_value = "ASSIGNED")]
    Assigned,
    #[sea_orm(string_value = "PICKED_UP")]
    PickedUp,
    #[sea_orm(string_value = "OUT_FOR_DELIVERY")]
    OutForDelivery,
    #[sea_orm(string_value = "DELIVERED")]
    Delivered,
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
}

impl OrderStatus {
    /// The single legal next status an agent may progress an order to.
    ///
    /// Anything else, skip or regression, is rejected by the progress
    /// service. `PLACED` has no agent-driven successor; assignment is an
    /// admin operation.
    pub fn next_forward(self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Assigned => Some(OrderStatus::PickedUp),
            OrderStatus::PickedUp => Some(OrderStatus::OutForDelivery),
            OrderStatus::OutForDelivery => Some(OrderStatus::Delivered),
            _ => None,
        }
    }

    /// Terminal states admit no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Cancelled | OrderStatus::Delivered)
    }

    /// Statuses an agent console shows by default: everything from
    /// assignment onward.
    pub fn agent_visible() -> [OrderStatus; 4] {
        [
            OrderStatus::Assigned,
            OrderStatus::PickedUp,
            OrderStatus::OutForDelivery,
            OrderStatus::Delivered,
        ]
    }
}

/// Agent's standing answer to an assignment; meaningful while the order is
/// `ASSIGNED`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentResponse {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "ACCEPTED")]
    Accepted,
    #[sea_orm(string_value = "DECLINED")]
    Declined,
}

/// Decision submitted by an agent for a pending assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentDecision {
    Accept,
    Decline,
}

/// Operational state of a delivery agent.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum AgentStatus {
    #[sea_orm(string_value = "Active")]
    Active,
    #[sea_orm(string_value = "Inactive")]
    Inactive,
    #[sea_orm(string_value = "Suspended")]
    Suspended,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn forward_chain_is_single_step() {
        assert_eq!(
            OrderStatus::Assigned.next_forward(),
            Some(OrderStatus::PickedUp)
        );
        assert_eq!(
            OrderStatus::PickedUp.next_forward(),
            Some(OrderStatus::OutForDelivery)
        );
        assert_eq!(
            OrderStatus::OutForDelivery.next_forward(),
            Some(OrderStatus::Delivered)
        );
    }

    #[test]
    fn terminal_and_placed_have_no_successor() {
        assert_eq!(OrderStatus::Placed.next_forward(), None);
        assert_eq!(OrderStatus::Delivered.next_forward(), None);
        assert_eq!(OrderStatus::Cancelled.next_forward(), None);
    }

    #[test]
    fn terminal_states() {
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(!OrderStatus::OutForDelivery.is_terminal());
        assert!(!OrderStatus::Placed.is_terminal());
    }

    #[test]
    fn wire_names_round_trip() {
        assert_eq!(OrderStatus::OutForDelivery.to_string(), "OUT_FOR_DELIVERY");
        assert_eq!(
            OrderStatus::from_str("OUT_FOR_DELIVERY").unwrap(),
            OrderStatus::OutForDelivery
        );
        assert_eq!(OrderStatus::PickedUp.to_string(), "PICKED_UP");
    }
}
