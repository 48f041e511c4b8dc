use actix_web::{http::StatusCode, test, test::TestRequest, web, web::ServiceConfig, App};
use chrono::{TimeZone, Utc};
use log::debug;
use market_engine::db_types::{Order, OrderItem, OrderStatusType, PaymentProof, PaymentProofStatus};
use mkt_common::Money;
use serde_json::Value;

use crate::{
    auth::{ACTOR_ID_HEADER, ACTOR_ROLE_HEADER},
    middleware::IdentityMiddlewareFactory,
};

/// `(id, role)` as the auth proxy would forward them.
pub type Caller<'a> = Option<(&'a str, &'a str)>;

pub async fn get_request(caller: Caller<'_>, path: &str, configure: fn(&mut ServiceConfig)) -> (StatusCode, String) {
    send(with_caller(TestRequest::get().uri(path), caller), configure).await
}

pub async fn post_request(
    caller: Caller<'_>,
    path: &str,
    body: Value,
    configure: fn(&mut ServiceConfig),
) -> (StatusCode, String) {
    send(with_caller(TestRequest::post().uri(path).set_json(body), caller), configure).await
}

fn with_caller(mut req: TestRequest, caller: Caller<'_>) -> TestRequest {
    if let Some((id, role)) = caller {
        req = req.insert_header((ACTOR_ID_HEADER, id)).insert_header((ACTOR_ROLE_HEADER, role));
    }
    req
}

/// Runs the request through the `/api` scope exactly as the server mounts it. Errors raised by middleware are folded
/// into the same `(status, body)` shape as handler errors.
async fn send(req: TestRequest, configure: fn(&mut ServiceConfig)) -> (StatusCode, String) {
    let app = App::new().service(web::scope("/api").wrap(IdentityMiddlewareFactory::new()).configure(configure));
    let service = test::init_service(app).await;
    debug!("Making request");
    match test::try_call_service(&service, req.to_request()).await {
        Ok(res) => {
            let status = res.status();
            let body = test::read_body(res).await;
            (status, String::from_utf8_lossy(&body).into_owned())
        },
        Err(e) => (e.as_response_error().status_code(), e.to_string()),
    }
}

pub fn order(id: i64, buyer: &str, status: OrderStatusType) -> Order {
    Order {
        id,
        buyer_id: buyer.to_string(),
        total_amount: Money::from_units(40),
        status,
        delivery_address: "1 Main St".to_string(),
        created_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
    }
}

pub fn item(order_id: i64, seller: &str) -> OrderItem {
    OrderItem {
        id: order_id * 10,
        order_id,
        seller_id: seller.to_string(),
        product_id: "kettle".to_string(),
        quantity: 2,
        unit_price: Money::from_units(20),
    }
}

pub fn proof(id: i64, seller: &str, status: PaymentProofStatus) -> PaymentProof {
    PaymentProof {
        id,
        seller_id: seller.to_string(),
        amount_paid: Money::from_units(5),
        status,
        reference_code: "TRF-001".to_string(),
        review_note: None,
        submitted_at: Utc.with_ymd_and_hms(2024, 3, 2, 9, 0, 0).unwrap(),
        reviewed_at: None,
    }
}
