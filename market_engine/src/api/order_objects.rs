use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db_types::{CommissionStatus, Order, OrderItem, OrderStatusType, PaymentProofStatus};

/// An order together with its line items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

impl OrderWithItems {
    pub fn seller_ids(&self) -> Vec<String> {
        crate::notifications::distinct_sellers(self.items.iter().map(|i| i.seller_id.as_str()))
    }

    pub fn has_seller(&self, seller_id: &str) -> bool {
        self.items.iter().any(|i| i.seller_id == seller_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderQueryFilter {
    pub buyer_id: Option<String>,
    /// Orders containing at least one item from this seller
    pub seller_id: Option<String>,
    pub status: Option<Vec<OrderStatusType>>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl OrderQueryFilter {
    pub fn with_buyer_id<S: Into<String>>(mut self, buyer_id: S) -> Self {
        self.buyer_id = Some(buyer_id.into());
        self
    }

    pub fn with_seller_id<S: Into<String>>(mut self, seller_id: S) -> Self {
        self.seller_id = Some(seller_id.into());
        self
    }

    pub fn with_status(mut self, status: OrderStatusType) -> Self {
        self.status.get_or_insert_with(Vec::new).push(status);
        self
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    /// True if the filter matches every order. An empty status list places no restriction on status.
    pub fn is_empty(&self) -> bool {
        self.buyer_id.is_none() &&
            self.seller_id.is_none() &&
            self.status.as_ref().map_or(true, |s| s.is_empty()) &&
            self.since.is_none() &&
            self.until.is_none()
    }
}

impl Display for OrderQueryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "No filters.");
        }
        if let Some(buyer_id) = &self.buyer_id {
            write!(f, "buyer_id: {buyer_id}. ")?;
        }
        if let Some(seller_id) = &self.seller_id {
            write!(f, "seller_id: {seller_id}. ")?;
        }
        if let Some(statuses) = &self.status {
            let statuses = statuses.iter().map(|s| s.to_string()).collect::<Vec<String>>().join(",");
            write!(f, "statuses: [{statuses}]. ")?;
        }
        if let Some(since) = &self.since {
            write!(f, "since {since}. ")?;
        }
        if let Some(until) = &self.until {
            write!(f, "until {until}. ")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommissionQueryFilter {
    pub seller_id: Option<String>,
    pub order_id: Option<i64>,
    pub status: Option<CommissionStatus>,
}

impl CommissionQueryFilter {
    pub fn with_seller_id<S: Into<String>>(mut self, seller_id: S) -> Self {
        self.seller_id = Some(seller_id.into());
        self
    }

    pub fn with_order_id(mut self, order_id: i64) -> Self {
        self.order_id = Some(order_id);
        self
    }

    pub fn with_status(mut self, status: CommissionStatus) -> Self {
        self.status = Some(status);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PaymentProofQueryFilter {
    pub seller_id: Option<String>,
    pub status: Option<PaymentProofStatus>,
}

impl PaymentProofQueryFilter {
    pub fn with_seller_id<S: Into<String>>(mut self, seller_id: S) -> Self {
        self.seller_id = Some(seller_id.into());
        self
    }

    pub fn with_status(mut self, status: PaymentProofStatus) -> Self {
        self.status = Some(status);
        self
    }
}
