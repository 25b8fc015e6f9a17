pub mod pricing;
pub mod status;

pub use status::{AgentDecision, AgentResponse, AgentStatus, OrderStatus};
