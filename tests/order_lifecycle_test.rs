mod common;

use axum::http::{Method, StatusCode};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde_json::json;
use uuid::Uuid;

use common::{sample_cart, TestApp};
use storefront_api::{
    auth::ActorRole,
    entities::cart_item,
    models::AgentStatus,
};

#[tokio::test]
async fn cash_on_delivery_creates_priced_orders() {
    let app = TestApp::spawn().await;
    let buyer = app.seed_customer("buyer@test.local").await;
    let address = app.seed_address(buyer.id).await;
    let token = app.token(buyer.id, ActorRole::Customer);

    let (status, body) = app
        .request(
            Method::POST,
            "/api/order/cash-on-delivery",
            Some(&token),
            Some(sample_cart(address.id)),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    let orders = body["data"].as_array().unwrap();
    assert_eq!(orders.len(), 1);

    let order = &orders[0];
    // 100 at 10% off is 90 per unit, 270 for three
    assert_eq!(order["total"], json!("270"));
    assert_eq!(order["sub_total"], json!("270"));
    assert_eq!(order["order_status"], json!("PLACED"));
    assert_eq!(order["payment_status"], json!("CASH ON DELIVERY"));
    assert_eq!(order["quantity"], json!(3));
    assert!(order["order_number"]
        .as_str()
        .unwrap()
        .starts_with("ORD-"));
}

#[tokio::test]
async fn multi_line_checkout_creates_one_order_per_line() {
    let app = TestApp::spawn().await;
    let buyer = app.seed_customer("multi@test.local").await;
    let address = app.seed_address(buyer.id).await;
    let token = app.token(buyer.id, ActorRole::Customer);

    let cart = json!({
        "items": [
            {"product_id": Uuid::new_v4(), "name": "Mug", "price": "100", "discount_percent": 10, "quantity": 1},
            {"product_id": Uuid::new_v4(), "name": "Plate", "price": "250", "quantity": 2}
        ],
        "address_id": address.id
    });

    let (status, body) = app
        .request(Method::POST, "/api/order/cash-on-delivery", Some(&token), Some(cart))
        .await;

    assert_eq!(status, StatusCode::OK);
    let orders = body["data"].as_array().unwrap();
    assert_eq!(orders.len(), 2);

    let numbers: Vec<&str> = orders
        .iter()
        .map(|o| o["order_number"].as_str().unwrap())
        .collect();
    assert_ne!(numbers[0], numbers[1]);
}

#[tokio::test]
async fn checkout_clears_the_cart() {
    let app = TestApp::spawn().await;
    let buyer = app.seed_customer("cart@test.local").await;
    let address = app.seed_address(buyer.id).await;
    app.seed_cart_item(buyer.id).await;
    let token = app.token(buyer.id, ActorRole::Customer);

    let (status, _) = app
        .request(
            Method::POST,
            "/api/order/cash-on-delivery",
            Some(&token),
            Some(sample_cart(address.id)),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let remaining = cart_item::Entity::find()
        .filter(cart_item::Column::CustomerId.eq(buyer.id))
        .all(&*app.db)
        .await
        .unwrap();
    assert!(remaining.is_empty());
}

#[tokio::test]
async fn invalid_cart_lines_are_rejected() {
    let app = TestApp::spawn().await;
    let buyer = app.seed_customer("bad-cart@test.local").await;
    let address = app.seed_address(buyer.id).await;
    let token = app.token(buyer.id, ActorRole::Customer);

    let zero_price = json!({
        "items": [{"product_id": Uuid::new_v4(), "name": "Free", "price": "0", "quantity": 1}],
        "address_id": address.id
    });
    let (status, _) = app
        .request(Method::POST, "/api/order/cash-on-delivery", Some(&token), Some(zero_price))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let empty = json!({ "items": [], "address_id": address.id });
    let (status, _) = app
        .request(Method::POST, "/api/order/cash-on-delivery", Some(&token), Some(empty))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn order_list_is_scoped_to_the_caller() {
    let app = TestApp::spawn().await;
    let buyer = app.seed_customer("mine@test.local").await;
    let other = app.seed_customer("other@test.local").await;
    let address = app.seed_address(buyer.id).await;
    let other_address = app.seed_address(other.id).await;

    let buyer_token = app.token(buyer.id, ActorRole::Customer);
    let other_token = app.token(other.id, ActorRole::Customer);

    app.request(
        Method::POST,
        "/api/order/cash-on-delivery",
        Some(&buyer_token),
        Some(sample_cart(address.id)),
    )
    .await;
    app.request(
        Method::POST,
        "/api/order/cash-on-delivery",
        Some(&other_token),
        Some(sample_cart(other_address.id)),
    )
    .await;

    let (status, body) = app
        .request(Method::GET, "/api/order/order-list", Some(&buyer_token), None)
        .await;

    assert_eq!(status, StatusCode::OK);
    let orders = body["data"].as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["customer_id"], json!(buyer.id));
    assert_eq!(
        orders[0]["delivery_address"]["city"],
        json!("Pune")
    );
}

#[tokio::test]
async fn requests_without_a_token_are_rejected() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .request(Method::GET, "/api/order/order-list", None, None)
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], json!(true));
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn cancel_is_terminal_and_idempotency_conflicts() {
    let app = TestApp::spawn().await;
    let buyer = app.seed_customer("cancel@test.local").await;
    let address = app.seed_address(buyer.id).await;
    let token = app.token(buyer.id, ActorRole::Customer);

    let (_, body) = app
        .request(
            Method::POST,
            "/api/order/cash-on-delivery",
            Some(&token),
            Some(sample_cart(address.id)),
        )
        .await;
    let order_id: Uuid = serde_json::from_value(body["data"][0]["id"].clone()).unwrap();

    let (status, body) = app
        .request(
            Method::PUT,
            &format!("/api/order/cancel/{order_id}"),
            Some(&token),
            Some(json!({ "reason": "changed my mind" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["order_status"], json!("CANCELLED"));
    assert_eq!(body["data"]["cancel_reason"], json!("changed my mind"));
    assert!(!body["data"]["canceled_at"].is_null());

    // A second cancel is a conflict, not a silent success
    let (status, body) = app
        .request(
            Method::PUT,
            &format!("/api/order/cancel/{order_id}"),
            Some(&token),
            Some(json!({})),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], json!("Order already cancelled"));
}

#[tokio::test]
async fn delivered_orders_cannot_be_cancelled() {
    let app = TestApp::spawn().await;
    let buyer = app.seed_customer("delivered@test.local").await;
    let address = app.seed_address(buyer.id).await;
    let agent = app.seed_agent(AgentStatus::Active).await;
    let admin_token = app.token(Uuid::new_v4(), ActorRole::Admin);
    let customer_token = app.token(buyer.id, ActorRole::Customer);
    let agent_token = app.token(agent.id, ActorRole::Agent);

    let (_, body) = app
        .request(
            Method::POST,
            "/api/order/cash-on-delivery",
            Some(&customer_token),
            Some(sample_cart(address.id)),
        )
        .await;
    let order_id: Uuid = serde_json::from_value(body["data"][0]["id"].clone()).unwrap();

    app.request(
        Method::POST,
        "/api/order/assign",
        Some(&admin_token),
        Some(json!({ "order_id": order_id, "agent_id": agent.id })),
    )
    .await;
    for step in ["PICKED_UP", "OUT_FOR_DELIVERY", "DELIVERED"] {
        let (status, _) = app
            .request(
                Method::PUT,
                &format!("/api/order/agent/update-status/{order_id}"),
                Some(&agent_token),
                Some(json!({ "status": step })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = app
        .request(
            Method::PUT,
            &format!("/api/order/cancel/{order_id}"),
            Some(&customer_token),
            Some(json!({})),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], json!("Delivered order cannot be cancelled"));
}

#[tokio::test]
async fn only_cancelled_orders_can_be_deleted() {
    let app = TestApp::spawn().await;
    let buyer = app.seed_customer("delete@test.local").await;
    let address = app.seed_address(buyer.id).await;
    let token = app.token(buyer.id, ActorRole::Customer);

    let (_, body) = app
        .request(
            Method::POST,
            "/api/order/cash-on-delivery",
            Some(&token),
            Some(sample_cart(address.id)),
        )
        .await;
    let order_id: Uuid = serde_json::from_value(body["data"][0]["id"].clone()).unwrap();

    // Active order cannot be deleted
    let (status, _) = app
        .request(
            Method::DELETE,
            &format!("/api/order/delete/{order_id}"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    app.request(
        Method::PUT,
        &format!("/api/order/cancel/{order_id}"),
        Some(&token),
        Some(json!({})),
    )
    .await;

    let (status, _) = app
        .request(
            Method::DELETE,
            &format!("/api/order/delete/{order_id}"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(app.find_order(order_id).await.is_none());
}

#[tokio::test]
async fn orders_can_be_referenced_by_order_number() {
    let app = TestApp::spawn().await;
    let buyer = app.seed_customer("by-number@test.local").await;
    let address = app.seed_address(buyer.id).await;
    let token = app.token(buyer.id, ActorRole::Customer);

    let (_, body) = app
        .request(
            Method::POST,
            "/api/order/cash-on-delivery",
            Some(&token),
            Some(sample_cart(address.id)),
        )
        .await;
    let order_number = body["data"][0]["order_number"].as_str().unwrap().to_string();

    let (status, body) = app
        .request(
            Method::PUT,
            &format!("/api/order/cancel/{order_number}"),
            Some(&token),
            Some(json!({})),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["order_status"], json!("CANCELLED"));
}

#[tokio::test]
async fn customers_cannot_touch_other_customers_orders() {
    let app = TestApp::spawn().await;
    let buyer = app.seed_customer("owner@test.local").await;
    let outsider = app.seed_customer("outsider@test.local").await;
    let address = app.seed_address(buyer.id).await;
    let buyer_token = app.token(buyer.id, ActorRole::Customer);
    let outsider_token = app.token(outsider.id, ActorRole::Customer);

    let (_, body) = app
        .request(
            Method::POST,
            "/api/order/cash-on-delivery",
            Some(&buyer_token),
            Some(sample_cart(address.id)),
        )
        .await;
    let order_id: Uuid = serde_json::from_value(body["data"][0]["id"].clone()).unwrap();

    let (status, _) = app
        .request(
            Method::PUT,
            &format!("/api/order/cancel/{order_id}"),
            Some(&outsider_token),
            Some(json!({})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
