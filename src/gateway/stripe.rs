use async_trait::async_trait;
use serde_json::Value;
use tracing::instrument;
use uuid::Uuid;

use super::{
    CheckoutSession, CreateSessionRequest, PaymentGateway, SessionLineItem, SessionMetadata,
};
use crate::errors::ServiceError;

/// Stripe Checkout implementation of the gateway boundary, over the plain
/// REST API (form-encoded writes, JSON reads).
#[derive(Clone)]
pub struct StripeGateway {
    client: reqwest::Client,
    base_url: String,
    secret_key: String,
}

impl StripeGateway {
    pub fn new(base_url: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            secret_key: secret_key.into(),
        }
    }

    async fn get_json(&self, path: &str) -> Result<Value, ServiceError> {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(|e| ServiceError::Upstream(format!("gateway request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(ServiceError::Upstream(format!(
                "gateway returned {} for {path}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| ServiceError::Upstream(format!("invalid gateway response: {e}")))
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    #[instrument(skip(self, request), fields(lines = request.line_items.len()))]
    async fn create_checkout_session(
        &self,
        request: CreateSessionRequest,
    ) -> Result<CheckoutSession, ServiceError> {
        let mut params: Vec<(String, String)> = vec![
            ("mode".into(), "payment".into()),
            ("submit_type".into(), "pay".into()),
            ("payment_method_types[0]".into(), "card".into()),
            ("customer_email".into(), request.customer_email),
            ("success_url".into(), request.success_url),
            ("cancel_url".into(), request.cancel_url),
            (
                "metadata[customer_id]".into(),
                request.metadata.customer_id.to_string(),
            ),
            (
                "metadata[address_id]".into(),
                request.metadata.address_id.to_string(),
            ),
        ];

        for (i, item) in request.line_items.iter().enumerate() {
            let prefix = format!("line_items[{i}]");
            params.push((
                format!("{prefix}[price_data][currency]"),
                request.currency.clone(),
            ));
            params.push((
                format!("{prefix}[price_data][unit_amount]"),
                item.unit_amount_minor.to_string(),
            ));
            params.push((
                format!("{prefix}[price_data][product_data][name]"),
                item.name.clone(),
            ));
            params.push((
                format!("{prefix}[price_data][product_data][metadata][product_id]"),
                item.product_id.to_string(),
            ));
            for (j, image) in item.images.iter().enumerate() {
                params.push((
                    format!("{prefix}[price_data][product_data][images][{j}]"),
                    image.clone(),
                ));
            }
            params.push((format!("{prefix}[quantity]"), item.quantity.to_string()));
            params.push((
                format!("{prefix}[adjustable_quantity][enabled]"),
                "true".into(),
            ));
            params.push((
                format!("{prefix}[adjustable_quantity][minimum]"),
                "1".into(),
            ));
        }

        let response = self
            .client
            .post(format!("{}/v1/checkout/sessions", self.base_url))
            .bearer_auth(&self.secret_key)
            .form(&params)
            .send()
            .await
            .map_err(|e| ServiceError::Upstream(format!("gateway request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(ServiceError::Upstream(format!(
                "session creation returned {}",
                response.status()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ServiceError::Upstream(format!("invalid gateway response: {e}")))?;

        session_from_value(&body)
    }

    #[instrument(skip(self))]
    async fn retrieve_session(&self, session_id: &str) -> Result<CheckoutSession, ServiceError> {
        let body = self
            .get_json(&format!("/v1/checkout/sessions/{session_id}"))
            .await?;
        session_from_value(&body)
    }

    #[instrument(skip(self))]
    async fn list_line_items(
        &self,
        session_id: &str,
    ) -> Result<Vec<SessionLineItem>, ServiceError> {
        // Expanding the product object yields name, images, and the
        // product_id metadata in one round trip.
        let body = self
            .get_json(&format!(
                "/v1/checkout/sessions/{session_id}/line_items?limit=100&expand[]=data.price.product"
            ))
            .await?;

        let items = body["data"]
            .as_array()
            .ok_or_else(|| ServiceError::Upstream("line item list missing data".to_string()))?;

        items.iter().map(line_item_from_value).collect()
    }
}

/// Maps a gateway session payload into [`CheckoutSession`]. Also used to
/// interpret the session object embedded in webhook events.
pub fn session_from_value(value: &Value) -> Result<CheckoutSession, ServiceError> {
    let id = value["id"]
        .as_str()
        .ok_or_else(|| ServiceError::Upstream("session payload missing id".to_string()))?
        .to_string();

    // payment_intent arrives as a bare id, or as an object when expanded
    let payment_intent = match &value["payment_intent"] {
        Value::String(s) => Some(s.clone()),
        Value::Object(obj) => obj.get("id").and_then(Value::as_str).map(str::to_string),
        _ => None,
    };

    let metadata = value.get("metadata").and_then(|meta| {
        let customer_id = meta.get("customer_id")?.as_str()?.parse::<Uuid>().ok()?;
        let address_id = meta.get("address_id")?.as_str()?.parse::<Uuid>().ok()?;
        Some(SessionMetadata {
            customer_id,
            address_id,
        })
    });

    Ok(CheckoutSession {
        id,
        url: value["url"].as_str().map(str::to_string),
        payment_intent,
        payment_status: value["payment_status"].as_str().unwrap_or("").to_string(),
        metadata,
    })
}

fn line_item_from_value(item: &Value) -> Result<SessionLineItem, ServiceError> {
    let product = &item["price"]["product"];

    let product_id = product["metadata"]["product_id"]
        .as_str()
        .and_then(|s| s.parse::<Uuid>().ok())
        .ok_or_else(|| {
            ServiceError::Upstream("line item missing product_id metadata".to_string())
        })?;

    let product_images = product["images"]
        .as_array()
        .map(|images| {
            images
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Ok(SessionLineItem {
        product_id,
        product_name: product["name"].as_str().unwrap_or("").to_string(),
        product_images,
        quantity: item["quantity"].as_i64().unwrap_or(1) as i32,
        amount_total_minor: item["amount_total"].as_i64().unwrap_or(0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn session_parses_bare_payment_intent() {
        let session = session_from_value(&json!({
            "id": "cs_test_123",
            "payment_intent": "pi_456",
            "payment_status": "paid",
            "metadata": {
                "customer_id": "6a3bb017-1a2f-4e4a-a8d1-7d3a826a4c43",
                "address_id": "0de9f5f9-9a4c-4f27-b64e-0ac384ef0ed1"
            }
        }))
        .unwrap();

        assert_eq!(session.id, "cs_test_123");
        assert_eq!(session.payment_intent.as_deref(), Some("pi_456"));
        assert!(session.is_paid());
        assert!(session.metadata.is_some());
    }

    #[test]
    fn session_parses_expanded_payment_intent() {
        let session = session_from_value(&json!({
            "id": "cs_test_123",
            "payment_intent": {"id": "pi_789", "status": "succeeded"},
            "payment_status": "paid"
        }))
        .unwrap();

        assert_eq!(session.payment_intent.as_deref(), Some("pi_789"));
        assert!(session.metadata.is_none());
    }

    #[test]
    fn line_item_requires_product_metadata() {
        let err = line_item_from_value(&json!({
            "quantity": 1,
            "amount_total": 9000,
            "price": {"product": {"name": "Widget", "metadata": {}}}
        }));
        assert!(err.is_err());
    }

    #[test]
    fn line_item_maps_amount_and_images() {
        let item = line_item_from_value(&json!({
            "quantity": 3,
            "amount_total": 27000,
            "price": {"product": {
                "name": "Widget",
                "images": ["https://img/1.png"],
                "metadata": {"product_id": "6a3bb017-1a2f-4e4a-a8d1-7d3a826a4c43"}
            }}
        }))
        .unwrap();

        assert_eq!(item.quantity, 3);
        assert_eq!(item.amount_total_minor, 27000);
        assert_eq!(item.product_images, vec!["https://img/1.png".to_string()]);
    }
}
