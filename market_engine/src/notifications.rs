//! # Notification fan-out
//!
//! Every committed state change is described by a [`DomainEvent`]. [`dispatch`] turns an event into one
//! [`NewNotification`] per interested recipient. The admin class is always a recipient; buyers and sellers are added
//! when the event concerns them. The storage backend inserts the result in the same transaction as the triggering
//! write.
use std::collections::BTreeSet;

use crate::db_types::{
    Commission,
    NewNotification,
    NotificationType,
    Order,
    OrderStatusType,
    PaymentProof,
    PaymentProofStatus,
    Recipient,
};

/// A committed change that someone should hear about.
#[derive(Debug, Clone, Copy)]
pub enum DomainEvent<'a> {
    OrderPlaced { order: &'a Order, sellers: &'a [String] },
    /// `order` carries the new status.
    OrderTransitioned { order: &'a Order, from: OrderStatusType, sellers: &'a [String] },
    CommissionCreated { commission: &'a Commission },
    PaymentProofSubmitted { proof: &'a PaymentProof },
    /// `proof` carries the review outcome.
    PaymentProofReviewed { proof: &'a PaymentProof },
    CommissionPaid { commission: &'a Commission, proof: &'a PaymentProof },
}

/// The distinct seller ids of an order, sorted.
pub fn distinct_sellers<'s, I: IntoIterator<Item = &'s str>>(seller_ids: I) -> Vec<String> {
    seller_ids.into_iter().collect::<BTreeSet<_>>().into_iter().map(String::from).collect()
}

pub fn dispatch(event: &DomainEvent<'_>) -> Vec<NewNotification> {
    match *event {
        DomainEvent::OrderPlaced { order, sellers } => {
            let message = format!("New order #{} placed for {}", order.id, order.total_amount);
            fan_out(NotificationType::OrderStatusChanged, message, order.id, seller_recipients(sellers))
        },
        DomainEvent::OrderTransitioned { order, from, sellers } => order_transitioned(order, from, sellers),
        DomainEvent::CommissionCreated { commission } => {
            let message = format!(
                "Commission of {} created for seller {} on order #{}",
                commission.amount, commission.seller_id, commission.order_id
            );
            fan_out(NotificationType::CommissionCreated, message, commission.id, vec![Recipient::seller(
                &commission.seller_id,
            )])
        },
        DomainEvent::PaymentProofSubmitted { proof } => {
            let message = format!(
                "Seller {} submitted a payment of {} (ref {})",
                proof.seller_id, proof.amount_paid, proof.reference_code
            );
            fan_out(NotificationType::PaymentProofSubmitted, message, proof.id, vec![])
        },
        DomainEvent::PaymentProofReviewed { proof } => {
            let (notification_type, verb) = match proof.status {
                PaymentProofStatus::Approved => (NotificationType::PaymentApproved, "approved"),
                PaymentProofStatus::Rejected => (NotificationType::PaymentRejected, "rejected"),
                PaymentProofStatus::Pending => return vec![],
            };
            let mut message = format!("Payment of {} (ref {}) was {verb}", proof.amount_paid, proof.reference_code);
            if let Some(note) = proof.review_note.as_deref() {
                message.push_str(": ");
                message.push_str(note);
            }
            fan_out(notification_type, message, proof.id, vec![Recipient::seller(&proof.seller_id)])
        },
        DomainEvent::CommissionPaid { commission, proof } => {
            let message = format!(
                "Commission #{} of {} from seller {} settled by payment {}",
                commission.id, commission.amount, commission.seller_id, proof.reference_code
            );
            fan_out(NotificationType::CommissionPaid, message, commission.id, vec![])
        },
    }
}

fn order_transitioned(order: &Order, from: OrderStatusType, sellers: &[String]) -> Vec<NewNotification> {
    let id = order.id;
    match order.status {
        OrderStatusType::Delivered => fan_out(
            NotificationType::OrderDelivered,
            format!("Order #{id} was delivered"),
            id,
            vec![Recipient::buyer(&order.buyer_id)],
        ),
        OrderStatusType::Completed => fan_out(
            NotificationType::OrderCompleted,
            format!("Order #{id} is complete"),
            id,
            seller_recipients(sellers),
        ),
        OrderStatusType::Cancelled => {
            let mut extra = vec![Recipient::buyer(&order.buyer_id)];
            extra.extend(seller_recipients(sellers));
            fan_out(
                NotificationType::OrderStatusChanged,
                format!("Order #{id} was cancelled while {from}"),
                id,
                extra,
            )
        },
        status => fan_out(
            NotificationType::OrderStatusChanged,
            format!("Order #{id} moved from {from} to {status}"),
            id,
            vec![Recipient::buyer(&order.buyer_id)],
        ),
    }
}

fn seller_recipients(sellers: &[String]) -> Vec<Recipient> {
    sellers.iter().map(Recipient::seller).collect()
}

fn fan_out(
    notification_type: NotificationType,
    message: String,
    related_id: i64,
    extra: Vec<Recipient>,
) -> Vec<NewNotification> {
    std::iter::once(Recipient::admin())
        .chain(extra)
        .map(|recipient| NewNotification { notification_type, message: message.clone(), related_id, recipient })
        .collect()
}

#[cfg(test)]
mod test {
    use chrono::Utc;
    use mkt_common::Money;

    use super::*;
    use crate::db_types::{CommissionStatus, Role};

    fn order(status: OrderStatusType) -> Order {
        Order {
            id: 42,
            buyer_id: "bianca".into(),
            total_amount: Money::from(4_000),
            status,
            delivery_address: "1 Main St".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn commission(id: i64) -> Commission {
        Commission {
            id,
            order_id: 42,
            seller_id: "sam".into(),
            amount: Money::from(400),
            status: CommissionStatus::Paid,
            created_at: Utc::now(),
            paid_at: Some(Utc::now()),
            payment_proof_id: Some(9),
        }
    }

    fn proof(status: PaymentProofStatus) -> PaymentProof {
        PaymentProof {
            id: 9,
            seller_id: "sam".into(),
            amount_paid: Money::from(360),
            status,
            reference_code: "TX-1".into(),
            review_note: None,
            submitted_at: Utc::now(),
            reviewed_at: None,
        }
    }

    fn recipients(notes: &[NewNotification]) -> Vec<String> {
        notes.iter().map(|n| n.recipient.to_string()).collect()
    }

    #[test]
    fn admin_always_comes_first() {
        let sellers = distinct_sellers(["sam", "sue", "sam"]);
        let o = order(OrderStatusType::Pending);
        let notes = dispatch(&DomainEvent::OrderPlaced { order: &o, sellers: &sellers });
        assert_eq!(recipients(&notes), vec!["admin", "seller:sam", "seller:sue"]);
        assert!(notes.iter().all(|n| n.related_id == 42));
    }

    #[test]
    fn delivery_goes_to_the_buyer() {
        let o = order(OrderStatusType::Delivered);
        let notes =
            dispatch(&DomainEvent::OrderTransitioned { order: &o, from: OrderStatusType::InTransit, sellers: &[] });
        assert_eq!(recipients(&notes), vec!["admin", "buyer:bianca"]);
        assert!(notes.iter().all(|n| n.notification_type == NotificationType::OrderDelivered));
    }

    #[test]
    fn completion_goes_to_every_seller() {
        let sellers = distinct_sellers(["sam", "sue"]);
        let o = order(OrderStatusType::Completed);
        let event = DomainEvent::OrderTransitioned { order: &o, from: OrderStatusType::Delivered, sellers: &sellers };
        let notes = dispatch(&event);
        assert_eq!(recipients(&notes), vec!["admin", "seller:sam", "seller:sue"]);
        assert_eq!(notes[0].notification_type, NotificationType::OrderCompleted);
    }

    #[test]
    fn cancellation_reaches_everyone() {
        let sellers = distinct_sellers(["sam"]);
        let o = order(OrderStatusType::Cancelled);
        let event = DomainEvent::OrderTransitioned { order: &o, from: OrderStatusType::Preparing, sellers: &sellers };
        let notes = dispatch(&event);
        assert_eq!(recipients(&notes), vec!["admin", "buyer:bianca", "seller:sam"]);
        assert!(notes[0].message.contains("cancelled while preparing"));
    }

    #[test]
    fn commission_paid_is_admin_only() {
        let (c, p) = (commission(3), proof(PaymentProofStatus::Approved));
        let notes = dispatch(&DomainEvent::CommissionPaid { commission: &c, proof: &p });
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].recipient.role, Role::Admin);
        assert_eq!(notes[0].notification_type, NotificationType::CommissionPaid);
        assert_eq!(notes[0].related_id, 3);
    }

    #[test]
    fn review_outcome_selects_the_type() {
        let mut p = proof(PaymentProofStatus::Rejected);
        p.review_note = Some("reference not found".into());
        let notes = dispatch(&DomainEvent::PaymentProofReviewed { proof: &p });
        assert_eq!(recipients(&notes), vec!["admin", "seller:sam"]);
        assert_eq!(notes[1].notification_type, NotificationType::PaymentRejected);
        assert!(notes[1].message.ends_with("rejected: reference not found"));
        let pending = proof(PaymentProofStatus::Pending);
        assert!(dispatch(&DomainEvent::PaymentProofReviewed { proof: &pending }).is_empty());
    }

    #[test]
    fn submission_is_for_admin() {
        let p = proof(PaymentProofStatus::Pending);
        let notes = dispatch(&DomainEvent::PaymentProofSubmitted { proof: &p });
        assert_eq!(recipients(&notes), vec!["admin"]);
    }
}
