//! Payment gateway boundary.
//!
//! The order core talks to the card-payment provider through the
//! [`PaymentGateway`] trait only: create a hosted checkout session, fetch a
//! session back, list its line items. The Stripe-backed implementation lives
//! in [`stripe`]; tests substitute a scripted gateway.

pub mod stripe;
pub mod webhook;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ServiceError;

pub use stripe::StripeGateway;

/// Checkout metadata round-tripped through the gateway so that the webhook
/// and the confirm endpoint can both recover the purchasing context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionMetadata {
    pub customer_id: Uuid,
    pub address_id: Uuid,
}

/// A gateway checkout session, as seen by reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    /// Hosted payment page the client is redirected to.
    pub url: Option<String>,
    /// Payment correlation id; present once the session has a payment.
    pub payment_intent: Option<String>,
    /// Gateway payment state, `paid` when settled.
    pub payment_status: String,
    pub metadata: Option<SessionMetadata>,
}

impl CheckoutSession {
    pub fn is_paid(&self) -> bool {
        self.payment_status == "paid"
    }
}

/// One line of a completed checkout session. Amounts are in minor currency
/// units, as the gateway reports them.
#[derive(Debug, Clone)]
pub struct SessionLineItem {
    pub product_id: Uuid,
    pub product_name: String,
    pub product_images: Vec<String>,
    pub quantity: i32,
    pub amount_total_minor: i64,
}

/// Input line for session creation, already discounted and in minor units.
#[derive(Debug, Clone)]
pub struct CreateSessionLineItem {
    pub product_id: Uuid,
    pub name: String,
    pub images: Vec<String>,
    pub unit_amount_minor: i64,
    pub quantity: u32,
}

#[derive(Debug, Clone)]
pub struct CreateSessionRequest {
    pub customer_email: String,
    pub currency: String,
    pub metadata: SessionMetadata,
    pub success_url: String,
    pub cancel_url: String,
    pub line_items: Vec<CreateSessionLineItem>,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Creates a hosted checkout session and returns its id and redirect URL.
    async fn create_checkout_session(
        &self,
        request: CreateSessionRequest,
    ) -> Result<CheckoutSession, ServiceError>;

    /// Fetches a session by id.
    async fn retrieve_session(&self, session_id: &str) -> Result<CheckoutSession, ServiceError>;

    /// Lists the line items of a session, product metadata resolved.
    async fn list_line_items(
        &self,
        session_id: &str,
    ) -> Result<Vec<SessionLineItem>, ServiceError>;
}
