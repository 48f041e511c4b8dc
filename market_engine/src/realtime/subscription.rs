use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::db_types::{Commission, Notification, Order, OrderItem, PaymentProof, Recipient};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Orders,
    OrderItems,
    Commissions,
    SellerPaymentProofs,
    AdminNotifications,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Orders => "orders",
            Self::OrderItems => "order_items",
            Self::Commissions => "commissions",
            Self::SellerPaymentProofs => "seller_payment_proofs",
            Self::AdminNotifications => "admin_notifications",
        }
    }
}

impl Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowOperation {
    Insert,
    Update,
}

/// A row image carried by a [`RowChange`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "table", content = "row", rename_all = "snake_case")]
pub enum Row {
    Order(Order),
    OrderItem(OrderItem),
    Commission(Commission),
    PaymentProof(PaymentProof),
    Notification(Notification),
}

impl Row {
    pub fn table(&self) -> Table {
        match self {
            Row::Order(_) => Table::Orders,
            Row::OrderItem(_) => Table::OrderItems,
            Row::Commission(_) => Table::Commissions,
            Row::PaymentProof(_) => Table::SellerPaymentProofs,
            Row::Notification(_) => Table::AdminNotifications,
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            Row::Order(r) => r.id,
            Row::OrderItem(r) => r.id,
            Row::Commission(r) => r.id,
            Row::PaymentProof(r) => r.id,
            Row::Notification(r) => r.id,
        }
    }

    /// The row version. Order items are immutable and always at version 1.
    pub fn version(&self) -> i64 {
        match self {
            Row::Order(r) => r.version(),
            Row::OrderItem(_) => 1,
            Row::Commission(r) => r.version(),
            Row::PaymentProof(r) => r.version(),
            Row::Notification(r) => r.version(),
        }
    }
}

/// One committed write, as delivered to realtime subscribers.
///
/// Delivery is at-least-once. Changes reach each subscriber in the order they were published, and a row's writes are
/// published in commit order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowChange {
    pub operation: RowOperation,
    pub before: Option<Row>,
    pub after: Row,
    /// For order and order-item rows, the sellers with items in the order. Items never change, so this is a fixed
    /// property of the order and lets sellers subscribe to the orders they are part of.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub seller_ids: Vec<String>,
}

impl RowChange {
    pub fn insert(after: Row) -> Self {
        Self { operation: RowOperation::Insert, before: None, after, seller_ids: Vec::new() }
    }

    pub fn update(before: Row, after: Row) -> Self {
        Self { operation: RowOperation::Update, before: Some(before), after, seller_ids: Vec::new() }
    }

    pub fn with_sellers(mut self, seller_ids: &[String]) -> Self {
        self.seller_ids = seller_ids.to_vec();
        self
    }

    pub fn table(&self) -> Table {
        self.after.table()
    }

    pub fn row_id(&self) -> i64 {
        self.after.id()
    }
}

/// A filter over the rows of one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum RowPredicate {
    All,
    Id(i64),
    BuyerId(String),
    SellerId(String),
    Recipient(Recipient),
}

impl RowPredicate {
    pub fn matches(&self, change: &RowChange) -> bool {
        match self {
            RowPredicate::All => true,
            RowPredicate::Id(id) => change.row_id() == *id,
            RowPredicate::BuyerId(buyer) => matches!(&change.after, Row::Order(o) if &o.buyer_id == buyer),
            RowPredicate::SellerId(seller) => match &change.after {
                Row::Order(_) => change.seller_ids.contains(seller),
                Row::OrderItem(item) => &item.seller_id == seller,
                Row::Commission(c) => &c.seller_id == seller,
                Row::PaymentProof(p) => &p.seller_id == seller,
                Row::Notification(_) => false,
            },
            RowPredicate::Recipient(recipient) => {
                matches!(&change.after, Row::Notification(n) if &n.recipient() == recipient)
            },
        }
    }
}

impl Display for RowPredicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RowPredicate::All => write!(f, "*"),
            RowPredicate::Id(id) => write!(f, "id = {id}"),
            RowPredicate::BuyerId(id) => write!(f, "buyer_id = {id}"),
            RowPredicate::SellerId(id) => write!(f, "seller_id = {id}"),
            RowPredicate::Recipient(r) => write!(f, "recipient = {r}"),
        }
    }
}

/// A `(table, predicate)` pair registered with the change feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub table: Table,
    pub predicate: RowPredicate,
}

impl Subscription {
    pub fn new(table: Table, predicate: RowPredicate) -> Self {
        Self { table, predicate }
    }

    pub fn all(table: Table) -> Self {
        Self::new(table, RowPredicate::All)
    }

    pub fn matches(&self, change: &RowChange) -> bool {
        self.table == change.table() && self.predicate.matches(change)
    }
}

impl Display for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} WHERE {}", self.table, self.predicate)
    }
}
