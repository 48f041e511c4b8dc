//! Data types shared between the engine APIs and its storage backends.
use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use mkt_common::Money;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid value for {kind}: {value}")]
pub struct ConversionError {
    kind: &'static str,
    value: String,
}

impl ConversionError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self { kind, value: value.to_string() }
    }
}

//--------------------------------------         Role          ---------------------------------------------------------
/// The three classes of actor that can act on an order. Identity and role are verified upstream by the auth provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Buyer,
    Seller,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Buyer => "buyer",
            Role::Seller => "seller",
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "buyer" => Ok(Self::Buyer),
            "seller" => Ok(Self::Seller),
            _ => Err(ConversionError::new("role", s)),
        }
    }
}

//--------------------------------------         Actor         ---------------------------------------------------------
/// A verified identity making a request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub role: Role,
}

impl Actor {
    pub fn new<S: Into<String>>(id: S, role: Role) -> Self {
        Self { id: id.into(), role }
    }

    pub fn admin<S: Into<String>>(id: S) -> Self {
        Self::new(id, Role::Admin)
    }

    pub fn buyer<S: Into<String>>(id: S) -> Self {
        Self::new(id, Role::Buyer)
    }

    pub fn seller<S: Into<String>>(id: S) -> Self {
        Self::new(id, Role::Seller)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl Display for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.role, self.id)
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatusType {
    /// The order has been placed at checkout and awaits the seller.
    Pending,
    /// A seller has accepted the order and is preparing it.
    Preparing,
    /// The order has been handed to a carrier.
    InTransit,
    /// The carrier has delivered the order. Awaiting buyer confirmation.
    Delivered,
    /// Delivery was confirmed by the buyer or an admin. Terminal, and the only commission-triggering state.
    Completed,
    /// The order was cancelled before shipment. Terminal.
    Cancelled,
}

impl OrderStatusType {
    pub const ALL: [OrderStatusType; 6] = [
        OrderStatusType::Pending,
        OrderStatusType::Preparing,
        OrderStatusType::InTransit,
        OrderStatusType::Delivered,
        OrderStatusType::Completed,
        OrderStatusType::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Preparing => "preparing",
            Self::InTransit => "in_transit",
            Self::Delivered => "delivered",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Position of the status in the lifecycle. Every legal transition strictly increases the rank.
    pub fn rank(&self) -> i64 {
        match self {
            Self::Pending => 1,
            Self::Preparing => 2,
            Self::InTransit => 3,
            Self::Delivered => 4,
            Self::Completed => 5,
            Self::Cancelled => 6,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|v| v.as_str() == s).ok_or_else(|| ConversionError::new("order status", s))
    }
}

//--------------------------------------        Order          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub buyer_id: String,
    pub total_amount: Money,
    pub status: OrderStatusType,
    pub delivery_address: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// A per-row version that increases with every committed transition.
    pub fn version(&self) -> i64 {
        self.status.rank()
    }
}

//--------------------------------------      OrderItem        ---------------------------------------------------------
/// An immutable line item. A multi-seller order has items from several sellers.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub seller_id: String,
    pub product_id: String,
    pub quantity: i64,
    #[sqlx(rename = "price")]
    pub unit_price: Money,
}

impl OrderItem {
    pub fn subtotal(&self) -> Money {
        self.unit_price * self.quantity
    }
}

//--------------------------------------       NewOrder        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrderItem {
    pub seller_id: String,
    pub product_id: String,
    pub quantity: i64,
    pub unit_price: Money,
}

impl NewOrderItem {
    pub fn new<S, P>(seller_id: S, product_id: P, quantity: i64, unit_price: Money) -> Self
    where
        S: Into<String>,
        P: Into<String>,
    {
        Self { seller_id: seller_id.into(), product_id: product_id.into(), quantity, unit_price }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub buyer_id: String,
    pub delivery_address: String,
    pub items: Vec<NewOrderItem>,
}

impl NewOrder {
    pub fn new<S: Into<String>, A: Into<String>>(buyer_id: S, delivery_address: A) -> Self {
        Self { buyer_id: buyer_id.into(), delivery_address: delivery_address.into(), items: Vec::new() }
    }

    pub fn with_item(mut self, item: NewOrderItem) -> Self {
        self.items.push(item);
        self
    }

    /// The sum of the line item subtotals, or `None` on overflow.
    pub fn total_amount(&self) -> Option<Money> {
        self.items
            .iter()
            .try_fold(Money::zero(), |acc, item| item.unit_price.checked_mul(item.quantity)?.checked_add(acc))
    }
}

//--------------------------------------   CommissionStatus    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CommissionStatus {
    Pending,
    Paid,
}

impl Display for CommissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => f.write_str("pending"),
            Self::Paid => f.write_str("paid"),
        }
    }
}

//--------------------------------------      Commission       ---------------------------------------------------------
/// A debt owed by one seller to the platform for one completed order.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Commission {
    pub id: i64,
    pub order_id: i64,
    pub seller_id: String,
    pub amount: Money,
    pub status: CommissionStatus,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
    /// The approved payment proof that settled this commission
    pub payment_proof_id: Option<i64>,
}

impl Commission {
    pub fn version(&self) -> i64 {
        match self.status {
            CommissionStatus::Pending => 1,
            CommissionStatus::Paid => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCommission {
    pub order_id: i64,
    pub seller_id: String,
    pub amount: Money,
}

//--------------------------------------  PaymentProofStatus   ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentProofStatus {
    Pending,
    Approved,
    Rejected,
}

impl Display for PaymentProofStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => f.write_str("pending"),
            Self::Approved => f.write_str("approved"),
            Self::Rejected => f.write_str("rejected"),
        }
    }
}

//--------------------------------------     PaymentProof      ---------------------------------------------------------
/// A seller's claim of having paid down their commission debt.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct PaymentProof {
    pub id: i64,
    pub seller_id: String,
    pub amount_paid: Money,
    pub status: PaymentProofStatus,
    pub reference_code: String,
    pub review_note: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

impl PaymentProof {
    pub fn version(&self) -> i64 {
        match self.status {
            PaymentProofStatus::Pending => 1,
            PaymentProofStatus::Approved | PaymentProofStatus::Rejected => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPaymentProof {
    pub seller_id: String,
    pub amount_paid: Money,
    pub reference_code: String,
}

impl NewPaymentProof {
    pub fn new<S: Into<String>, R: Into<String>>(seller_id: S, amount_paid: Money, reference_code: R) -> Self {
        Self { seller_id: seller_id.into(), amount_paid, reference_code: reference_code.into() }
    }
}

//--------------------------------------   NotificationType    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    OrderStatusChanged,
    OrderDelivered,
    OrderCompleted,
    CommissionCreated,
    PaymentProofSubmitted,
    PaymentApproved,
    PaymentRejected,
    CommissionPaid,
}

impl Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::OrderStatusChanged => "order_status_changed",
            Self::OrderDelivered => "order_delivered",
            Self::OrderCompleted => "order_completed",
            Self::CommissionCreated => "commission_created",
            Self::PaymentProofSubmitted => "payment_proof_submitted",
            Self::PaymentApproved => "payment_approved",
            Self::PaymentRejected => "payment_rejected",
            Self::CommissionPaid => "commission_paid",
        };
        f.write_str(s)
    }
}

//--------------------------------------      Recipient        ---------------------------------------------------------
/// Who a notification is addressed to. Admin notifications go to the admin class as a whole, so carry no id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Recipient {
    pub role: Role,
    pub id: Option<String>,
}

impl Recipient {
    pub fn admin() -> Self {
        Self { role: Role::Admin, id: None }
    }

    pub fn buyer<S: Into<String>>(id: S) -> Self {
        Self { role: Role::Buyer, id: Some(id.into()) }
    }

    pub fn seller<S: Into<String>>(id: S) -> Self {
        Self { role: Role::Seller, id: Some(id.into()) }
    }

    /// Whether the given actor may read notifications addressed to this recipient.
    pub fn includes(&self, actor: &Actor) -> bool {
        match self.role {
            Role::Admin => actor.role == Role::Admin,
            role => actor.role == role && self.id.as_deref() == Some(actor.id.as_str()),
        }
    }
}

impl Display for Recipient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.id {
            Some(id) => write!(f, "{}:{id}", self.role),
            None => write!(f, "{}", self.role),
        }
    }
}

//--------------------------------------     Notification      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub message: String,
    pub related_id: i64,
    pub recipient_role: Role,
    pub recipient_id: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

impl Notification {
    pub fn recipient(&self) -> Recipient {
        Recipient { role: self.recipient_role, id: self.recipient_id.clone() }
    }

    pub fn version(&self) -> i64 {
        if self.is_read {
            2
        } else {
            1
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub notification_type: NotificationType,
    pub message: String,
    pub related_id: i64,
    pub recipient: Recipient,
}

//--------------------------------------   SellerDebtSummary   ---------------------------------------------------------
/// One row of the pending-commissions-by-seller aggregation.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct SellerDebtSummary {
    pub seller_id: String,
    pub total_owed: Money,
    pub count: i64,
    pub oldest_created_at: DateTime<Utc>,
}
