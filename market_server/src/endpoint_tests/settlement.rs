use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::{TimeZone, Utc};
use market_engine::{
    db_types::{Notification, NotificationType, OrderStatusType, PaymentProofStatus, Role},
    traits::{Committed, MarketplaceError},
    LedgerApi,
    NotificationApi,
    OrderFlowApi,
    SettlementApi,
};
use mkt_common::{CommissionRate, Money};
use serde_json::json;

use super::helpers::{get_request, post_request, proof};
use crate::{
    endpoint_tests::mocks::MockBackend,
    routes::{
        ApprovePaymentProofRoute,
        EnsureCommissionsRoute,
        MarkNotificationReadRoute,
        NotificationsRoute,
        PaidTotalRoute,
        RejectPaymentProofRoute,
        SubmitPaymentProofRoute,
    },
};

#[actix_web::test]
async fn seller_submits_a_payment_proof() {
    let _ = env_logger::try_init().ok();
    let body = json!({"amount_paid": 500, "reference_code": "TRF-001"});
    let (status, body) = post_request(Some(("sam", "seller")), "/api/payment_proofs", body, configure_proofs).await;
    assert_eq!(status, StatusCode::CREATED);
    let value: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(value["seller_id"], "sam");
    assert_eq!(value["status"], "pending");
}

#[actix_web::test]
async fn blank_references_are_rejected() {
    let _ = env_logger::try_init().ok();
    let body = json!({"amount_paid": 500, "reference_code": "   "});
    let (status, body) = post_request(Some(("sam", "seller")), "/api/payment_proofs", body, configure_proofs).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("reference"), "{body}");
}

#[actix_web::test]
async fn sellers_cannot_approve_their_own_proofs() {
    let _ = env_logger::try_init().ok();
    let (status, _) =
        post_request(Some(("sam", "seller")), "/api/payment_proofs/1/approve", json!({}), configure_proofs).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn approving_twice_is_a_conflict() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        post_request(Some(("root", "admin")), "/api/payment_proofs/1/approve", json!({}), configure_proofs).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body.contains("already been approved"), "{body}");
}

#[actix_web::test]
async fn admin_rejects_with_a_note() {
    let _ = env_logger::try_init().ok();
    let body = json!({"note": "No such transfer"});
    let (status, body) =
        post_request(Some(("root", "admin")), "/api/payment_proofs/2/reject", body, configure_proofs).await;
    assert_eq!(status, StatusCode::OK);
    let value: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(value["status"], "rejected");
    assert_eq!(value["review_note"], "No such transfer");
}

fn configure_proofs(cfg: &mut ServiceConfig) {
    let mut backend = MockBackend::new();
    backend.expect_insert_payment_proof().withf(|p| p.seller_id == "sam").returning(|p| {
        let mut stored = proof(1, &p.seller_id, PaymentProofStatus::Pending);
        stored.amount_paid = p.amount_paid;
        stored.reference_code = p.reference_code;
        Ok(Committed::unchanged(stored))
    });
    backend.expect_approve_payment_proof().returning(|id| {
        Err(MarketplaceError::PaymentProofAlreadyReviewed { id, status: PaymentProofStatus::Approved })
    });
    backend
        .expect_reject_payment_proof()
        .withf(|id, note| *id == 2 && note.as_deref() == Some("No such transfer"))
        .returning(|id, note| {
            let mut rejected = proof(id, "sam", PaymentProofStatus::Rejected);
            rejected.review_note = note;
            Ok(Committed::unchanged(rejected))
        });
    let api = SettlementApi::new(backend, Default::default());
    cfg.service(SubmitPaymentProofRoute::<MockBackend>::new())
        .service(ApprovePaymentProofRoute::<MockBackend>::new())
        .service(RejectPaymentProofRoute::<MockBackend>::new())
        .app_data(web::Data::new(api));
}

#[actix_web::test]
async fn commissions_need_a_completed_order() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        post_request(Some(("root", "admin")), "/api/orders/9/commissions", json!({}), configure_commissions).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body.contains("delivered"), "{body}");
}

fn configure_commissions(cfg: &mut ServiceConfig) {
    let mut backend = MockBackend::new();
    backend.expect_ensure_commissions().returning(|order_id, _| {
        Err(MarketplaceError::CommissionNotTriggered { order_id, status: OrderStatusType::Delivered })
    });
    let rate = CommissionRate::from_basis_points(1_000).unwrap();
    let api = OrderFlowApi::new(backend, Default::default(), rate);
    cfg.service(EnsureCommissionsRoute::<MockBackend>::new()).app_data(web::Data::new(api));
}

#[actix_web::test]
async fn sellers_see_only_their_own_paid_total() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request(Some(("sam", "seller")), "/api/sellers/sam/paid_total", configure_ledger).await;
    assert_eq!(status, StatusCode::OK);
    let value: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(value["paid_total"], 75_000);
    let (status, _) = get_request(Some(("sam", "seller")), "/api/sellers/sue/paid_total", configure_ledger).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = get_request(Some(("bianca", "buyer")), "/api/sellers/sam/paid_total", configure_ledger).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = get_request(Some(("root", "admin")), "/api/sellers/sue/paid_total", configure_ledger).await;
    assert_eq!(status, StatusCode::OK);
}

fn configure_ledger(cfg: &mut ServiceConfig) {
    let mut backend = MockBackend::new();
    backend.expect_paid_total_for_seller().returning(|seller| match seller {
        "sam" => Ok(Money::from_units(750)),
        _ => Ok(Money::zero()),
    });
    let api = LedgerApi::new(backend);
    cfg.service(PaidTotalRoute::<MockBackend>::new()).app_data(web::Data::new(api));
}

fn notification(id: i64, recipient_role: Role, recipient_id: Option<&str>) -> Notification {
    Notification {
        id,
        notification_type: NotificationType::CommissionCreated,
        message: "A commission of 35.00 is due for order #3".to_string(),
        related_id: 3,
        recipient_role,
        recipient_id: recipient_id.map(String::from),
        is_read: false,
        created_at: Utc.with_ymd_and_hms(2024, 3, 3, 8, 0, 0).unwrap(),
        read_at: None,
    }
}

#[actix_web::test]
async fn unread_notifications_for_the_caller() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        get_request(Some(("sam", "seller")), "/api/notifications?unread_only=true", configure_notifications).await;
    assert_eq!(status, StatusCode::OK);
    let value: Vec<serde_json::Value> = serde_json::from_str(&body).unwrap();
    assert_eq!(value.len(), 1);
    assert_eq!(value[0]["type"], "commission_created");
}

#[actix_web::test]
async fn only_the_recipient_marks_a_notification_read() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        post_request(Some(("sam", "seller")), "/api/notifications/5/read", json!({}), configure_notifications).await;
    assert_eq!(status, StatusCode::OK);
    let value: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(value["is_read"], true);
    let (status, _) =
        post_request(Some(("sue", "seller")), "/api/notifications/5/read", json!({}), configure_notifications).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) =
        post_request(Some(("sam", "seller")), "/api/notifications/6/read", json!({}), configure_notifications).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

fn configure_notifications(cfg: &mut ServiceConfig) {
    let mut backend = MockBackend::new();
    backend
        .expect_fetch_notifications_for()
        .withf(|recipient, unread_only| recipient.id.as_deref() == Some("sam") && *unread_only)
        .returning(|_, _| Ok(vec![notification(5, Role::Seller, Some("sam"))]));
    backend.expect_fetch_notification().returning(|id| match id {
        5 => Ok(Some(notification(5, Role::Seller, Some("sam")))),
        _ => Ok(None),
    });
    backend.expect_mark_notification_read().returning(|id| {
        let mut read = notification(id, Role::Seller, Some("sam"));
        read.is_read = true;
        read.read_at = Some(Utc.with_ymd_and_hms(2024, 3, 3, 9, 0, 0).unwrap());
        Ok(Committed::unchanged(read))
    });
    let api = NotificationApi::new(backend, Default::default());
    cfg.service(NotificationsRoute::<MockBackend>::new())
        .service(MarkNotificationReadRoute::<MockBackend>::new())
        .app_data(web::Data::new(api));
}
