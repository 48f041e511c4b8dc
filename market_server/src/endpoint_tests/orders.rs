use actix_web::{http::StatusCode, web, web::ServiceConfig};
use market_engine::{
    db_types::OrderStatusType,
    traits::{Committed, MarketplaceError, PlacedOrder},
    LedgerApi,
    OrderFlowApi,
};
use mkt_common::CommissionRate;
use serde_json::json;

use super::helpers::{get_request, item, order, post_request};
use crate::{
    endpoint_tests::mocks::MockBackend,
    routes::{OrderByIdRoute, OrdersRoute, PlaceOrderRoute, TransitionOrderRoute},
};

fn new_order_body() -> serde_json::Value {
    json!({
        "delivery_address": "1 Main St",
        "items": [{"seller_id": "sam", "product_id": "kettle", "quantity": 2, "unit_price": 2000}]
    })
}

#[actix_web::test]
async fn place_order_without_identity() {
    let _ = env_logger::try_init().ok();
    let (status, body) = post_request(None, "/api/orders", new_order_body(), configure_checkout).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("x-actor-id"), "{body}");
}

#[actix_web::test]
async fn place_order_as_buyer() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        post_request(Some(("bianca", "buyer")), "/api/orders", new_order_body(), configure_checkout).await;
    assert_eq!(status, StatusCode::CREATED);
    let placed: PlacedOrder = serde_json::from_str(&body).unwrap();
    assert_eq!(placed.order.buyer_id, "bianca");
    assert_eq!(placed.order.status, OrderStatusType::Pending);
}

#[actix_web::test]
async fn sellers_cannot_place_orders() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        post_request(Some(("sam", "seller")), "/api/orders", new_order_body(), configure_checkout).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, "Insufficient permissions.");
}

#[actix_web::test]
async fn unknown_roles_are_unauthorized() {
    let _ = env_logger::try_init().ok();
    let (status, _) =
        post_request(Some(("bianca", "customer")), "/api/orders", new_order_body(), configure_checkout).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

fn configure_checkout(cfg: &mut ServiceConfig) {
    let mut backend = MockBackend::new();
    backend.expect_insert_order().withf(|o| o.buyer_id == "bianca" && o.items.len() == 1).returning(|o| {
        let mut placed = order(1, &o.buyer_id, OrderStatusType::Pending);
        placed.total_amount = o.total_amount().unwrap();
        Ok(Committed::unchanged(PlacedOrder { order: placed, items: vec![item(1, "sam")] }))
    });
    let api = OrderFlowApi::new(backend, Default::default(), CommissionRate::default());
    cfg.service(PlaceOrderRoute::<MockBackend>::new()).app_data(web::Data::new(api));
}

#[actix_web::test]
async fn stale_transition_is_a_conflict() {
    let _ = env_logger::try_init().ok();
    let body = json!({"expected": "pending", "target": "preparing"});
    let (status, body) =
        post_request(Some(("sam", "seller")), "/api/orders/7/transition", body, configure_transitions).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body.contains("Re-read the order"), "{body}");
}

#[actix_web::test]
async fn buyers_cannot_ship_orders() {
    let _ = env_logger::try_init().ok();
    let body = json!({"expected": "pending", "target": "preparing"});
    let (status, body) =
        post_request(Some(("bianca", "buyer")), "/api/orders/7/transition", body, configure_transitions).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.contains("error"), "{body}");
}

#[actix_web::test]
async fn skipping_a_step_is_a_bad_request() {
    let _ = env_logger::try_init().ok();
    let body = json!({"expected": "pending", "target": "delivered"});
    let (status, _) =
        post_request(Some(("sam", "seller")), "/api/orders/7/transition", body, configure_transitions).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn outsiders_cannot_move_an_order() {
    let _ = env_logger::try_init().ok();
    let body = json!({"expected": "pending", "target": "preparing"});
    let (status, _) =
        post_request(Some(("sid", "seller")), "/api/orders/7/transition", body, configure_transitions).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

fn configure_transitions(cfg: &mut ServiceConfig) {
    let mut backend = MockBackend::new();
    // Someone else already accepted the order
    backend.expect_fetch_order().returning(|id| Ok(Some(order(id, "bianca", OrderStatusType::Preparing))));
    backend.expect_fetch_order_items().returning(|id| Ok(vec![item(id, "sam")]));
    backend.expect_transition_order().returning(|change, _| {
        Err(MarketplaceError::StaleState {
            order_id: change.order_id,
            expected: change.expected,
            actual: OrderStatusType::Preparing,
        })
    });
    let api = OrderFlowApi::new(backend, Default::default(), CommissionRate::default());
    cfg.service(TransitionOrderRoute::<MockBackend>::new()).app_data(web::Data::new(api));
}

#[actix_web::test]
async fn fetch_order_as_participant() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request(Some(("sam", "seller")), "/api/orders/3", configure_queries).await;
    assert_eq!(status, StatusCode::OK);
    let value: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(value["order"]["buyer_id"], "bianca");
    assert_eq!(value["items"][0]["seller_id"], "sam");
}

#[actix_web::test]
async fn fetch_order_as_outsider() {
    let _ = env_logger::try_init().ok();
    let (status, _) = get_request(Some(("bob", "buyer")), "/api/orders/3", configure_queries).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn fetch_missing_order() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request(Some(("root", "admin")), "/api/orders/404", configure_queries).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("404 does not exist"), "{body}");
}

#[actix_web::test]
async fn order_search_is_scoped_to_the_buyer() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request(Some(("bianca", "buyer")), "/api/orders?status=pending", configure_queries).await;
    assert_eq!(status, StatusCode::OK);
    let orders: Vec<serde_json::Value> = serde_json::from_str(&body).unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["buyer_id"], "bianca");
}

fn configure_queries(cfg: &mut ServiceConfig) {
    let mut backend = MockBackend::new();
    backend.expect_fetch_order().returning(|id| match id {
        3 => Ok(Some(order(3, "bianca", OrderStatusType::InTransit))),
        _ => Ok(None),
    });
    backend.expect_fetch_order_items().returning(|id| Ok(vec![item(id, "sam")]));
    backend
        .expect_search_orders()
        .withf(|q| q.buyer_id.as_deref() == Some("bianca") && q.status == Some(vec![OrderStatusType::Pending]))
        .returning(|_| Ok(vec![order(3, "bianca", OrderStatusType::Pending)]));
    let api = LedgerApi::new(backend);
    cfg.service(OrdersRoute::<MockBackend>::new())
        .service(OrderByIdRoute::<MockBackend>::new())
        .app_data(web::Data::new(api));
}
