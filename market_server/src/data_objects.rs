//! Request bodies and query strings accepted by the HTTP surface.
//!
//! Responses are the engine's own types serialized as JSON, so only the inbound shapes live here.
use chrono::{DateTime, Utc};
use market_engine::{
    db_types::{NewOrder, NewOrderItem, OrderStatusType},
    order_objects::OrderQueryFilter,
};
use mkt_common::Money;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrderRequest {
    pub delivery_address: String,
    pub items: Vec<NewOrderItemRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrderItemRequest {
    pub seller_id: String,
    pub product_id: String,
    pub quantity: i64,
    pub unit_price: Money,
}

impl NewOrderRequest {
    /// The order as placed by `buyer_id`. The buyer always comes from the caller's identity, never the body.
    pub fn into_new_order(self, buyer_id: &str) -> NewOrder {
        self.items.into_iter().fold(NewOrder::new(buyer_id, self.delivery_address), |order, item| {
            order.with_item(NewOrderItem::new(item.seller_id, item.product_id, item.quantity, item.unit_price))
        })
    }
}

/// `expected` is the status the caller last observed. The move is refused with 409 if the order has since changed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TransitionRequest {
    pub expected: OrderStatusType,
    pub target: OrderStatusType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentProofRequest {
    pub amount_paid: Money,
    pub reference_code: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RejectRequest {
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationParams {
    #[serde(default)]
    pub unread_only: Option<bool>,
}

/// Query string for `GET /api/orders`. A single status is accepted, since query strings do not carry lists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderSearchParams {
    pub buyer_id: Option<String>,
    pub seller_id: Option<String>,
    pub status: Option<OrderStatusType>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl From<OrderSearchParams> for OrderQueryFilter {
    fn from(params: OrderSearchParams) -> Self {
        let mut filter = OrderQueryFilter::default();
        if let Some(id) = params.buyer_id {
            filter = filter.with_buyer_id(id);
        }
        if let Some(id) = params.seller_id {
            filter = filter.with_seller_id(id);
        }
        if let Some(status) = params.status {
            filter = filter.with_status(status);
        }
        if let Some(since) = params.since {
            filter = filter.since(since);
        }
        if let Some(until) = params.until {
            filter = filter.until(until);
        }
        filter
    }
}
