//! Shared integration test harness: an in-memory application wired to a
//! SQLite database and a scripted payment gateway.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::Utc;
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use storefront_api::{
    app_router,
    auth::{issue_token, ActorRole},
    config::AppConfig,
    db::run_migrations,
    entities::{address, cart_item, customer, delivery_agent, order},
    errors::ServiceError,
    gateway::{
        CheckoutSession, CreateSessionRequest, PaymentGateway, SessionLineItem, SessionMetadata,
    },
    models::AgentStatus,
    services::AppServices,
    AppState,
};

pub const TEST_JWT_SECRET: &str = "integration_test_secret_key_0123456789abcdef";
pub const TEST_WEBHOOK_SECRET: &str = "whsec_integration_test";

/// Scripted stand-in for the hosted payment gateway.
#[derive(Default)]
pub struct MockGateway {
    sessions: Mutex<HashMap<String, CheckoutSession>>,
    line_items: Mutex<HashMap<String, Vec<SessionLineItem>>>,
    created: Mutex<Vec<CreateSessionRequest>>,
}

impl MockGateway {
    /// Registers a session (and its line items) that retrieve and list calls
    /// will return.
    pub fn script_session(&self, session: CheckoutSession, items: Vec<SessionLineItem>) {
        self.line_items
            .lock()
            .unwrap()
            .insert(session.id.clone(), items);
        self.sessions
            .lock()
            .unwrap()
            .insert(session.id.clone(), session);
    }

    pub fn created_requests(&self) -> usize {
        self.created.lock().unwrap().len()
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_checkout_session(
        &self,
        request: CreateSessionRequest,
    ) -> Result<CheckoutSession, ServiceError> {
        let metadata = request.metadata.clone();
        let mut created = self.created.lock().unwrap();
        created.push(request);
        let id = format!("cs_test_{}", created.len());
        Ok(CheckoutSession {
            id: id.clone(),
            url: Some(format!("https://checkout.test/{id}")),
            payment_intent: None,
            payment_status: "unpaid".to_string(),
            metadata: Some(metadata),
        })
    }

    async fn retrieve_session(&self, session_id: &str) -> Result<CheckoutSession, ServiceError> {
        self.sessions
            .lock()
            .unwrap()
            .get(session_id)
            .cloned()
            .ok_or_else(|| ServiceError::Upstream("no such session".to_string()))
    }

    async fn list_line_items(
        &self,
        session_id: &str,
    ) -> Result<Vec<SessionLineItem>, ServiceError> {
        self.line_items
            .lock()
            .unwrap()
            .get(session_id)
            .cloned()
            .ok_or_else(|| ServiceError::Upstream("no such session".to_string()))
    }
}

pub struct TestApp {
    pub router: Router,
    pub db: Arc<DatabaseConnection>,
    pub config: Arc<AppConfig>,
    pub gateway: Arc<MockGateway>,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let config = Arc::new(test_config());

        let mut opt = sea_orm::ConnectOptions::new("sqlite::memory:");
        opt.max_connections(1).sqlx_logging(false);
        let db = Arc::new(
            sea_orm::Database::connect(opt)
                .await
                .expect("sqlite connection"),
        );
        run_migrations(&db).await.expect("migrations");

        let gateway = Arc::new(MockGateway::default());
        let services = AppServices::new(db.clone(), gateway.clone(), config.clone());

        let state = AppState {
            db: db.clone(),
            config: config.clone(),
            services,
        };

        Self {
            router: app_router(state),
            db,
            config,
            gateway,
        }
    }

    pub fn token(&self, sub: Uuid, role: ActorRole) -> String {
        issue_token(&self.config.jwt_secret, sub, role, 3600).expect("token")
    }

    pub async fn seed_customer(&self, email: &str) -> customer::Model {
        customer::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set("Test Customer".to_string()),
            email: Set(email.to_string()),
            mobile: Set(Some("9999999999".to_string())),
            cart_snapshot: Set(json!([])),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.db)
        .await
        .expect("seed customer")
    }

    pub async fn seed_address(&self, customer_id: Uuid) -> address::Model {
        address::ActiveModel {
            id: Set(Uuid::new_v4()),
            customer_id: Set(customer_id),
            address_line: Set("42 Harbor Lane".to_string()),
            city: Set("Pune".to_string()),
            state: Set("MH".to_string()),
            pincode: Set("411001".to_string()),
            country: Set("India".to_string()),
            mobile: Set(Some("9999999999".to_string())),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.db)
        .await
        .expect("seed address")
    }

    pub async fn seed_agent(&self, status: AgentStatus) -> delivery_agent::Model {
        delivery_agent::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set("Test Agent".to_string()),
            email: Set(format!("agent-{}@test.local", Uuid::new_v4().simple())),
            mobile: Set(None),
            status: Set(status),
            last_login_at: Set(None),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.db)
        .await
        .expect("seed agent")
    }

    pub async fn seed_cart_item(&self, customer_id: Uuid) -> cart_item::Model {
        cart_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            customer_id: Set(customer_id),
            product_id: Set(Uuid::new_v4()),
            quantity: Set(1),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.db)
        .await
        .expect("seed cart item")
    }

    pub async fn find_order(&self, id: Uuid) -> Option<order::Model> {
        order::Entity::find_by_id(id)
            .one(&*self.db)
            .await
            .expect("find order")
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .expect("request"),
            None => builder.body(Body::empty()).expect("request"),
        };

        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router response");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        (status, value)
    }
}

fn test_config() -> AppConfig {
    serde_json::from_value(json!({
        "database_url": "sqlite::memory:",
        "jwt_secret": TEST_JWT_SECRET,
        "environment": "test",
        "auto_migrate": true,
        "db_max_connections": 1,
        "db_min_connections": 1,
        "gateway_webhook_secret": TEST_WEBHOOK_SECRET,
        "frontend_url": "http://localhost:5173",
    }))
    .expect("test config")
}

/// A cart body with a single discounted line: 100 at 10% off, quantity 3.
pub fn sample_cart(address_id: Uuid) -> Value {
    json!({
        "items": [{
            "product_id": Uuid::new_v4(),
            "name": "Ceramic Mug",
            "images": ["https://img.test/mug.png"],
            "price": "100",
            "discount_percent": 10,
            "quantity": 3
        }],
        "address_id": address_id
    })
}

/// A paid session plus matching line items, ready for scripting.
pub fn paid_session(
    customer_id: Uuid,
    address_id: Uuid,
    session_id: &str,
    payment_intent: &str,
) -> (CheckoutSession, Vec<SessionLineItem>) {
    let session = CheckoutSession {
        id: session_id.to_string(),
        url: None,
        payment_intent: Some(payment_intent.to_string()),
        payment_status: "paid".to_string(),
        metadata: Some(SessionMetadata {
            customer_id,
            address_id,
        }),
    };

    let items = vec![SessionLineItem {
        product_id: Uuid::new_v4(),
        product_name: "Ceramic Mug".to_string(),
        product_images: vec!["https://img.test/mug.png".to_string()],
        quantity: 3,
        amount_total_minor: 27000,
    }];

    (session, items)
}

#[allow(dead_code)]
pub fn decimal(s: &str) -> Decimal {
    s.parse().expect("decimal literal")
}
