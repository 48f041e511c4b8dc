use mkt_common::CommissionRate;
use thiserror::Error;

use crate::{
    db_types::{NewOrder, NewPaymentProof, OrderStatusType, PaymentProof, PaymentProofStatus, Role},
    order_lifecycle::LifecycleError,
    reconciliation::ReconciliationReport,
    traits::{
        data_objects::{Committed, EnsuredCommissions, PlacedOrder, StatusChange, TransitionResult},
        CommissionManagement,
        NotificationApiError,
        NotificationManagement,
        OrderManagement,
        QueryApiError,
    },
};

/// The write side of a marketplace backend.
///
/// Every method here is a single storage transaction. Notifications are inserted in the same transaction as the write
/// that caused them, and a failure anywhere rolls the whole call back. Authorization is the caller's job; by the time
/// a request reaches the backend the actor has already been checked against the transition table and the order's
/// participants.
#[allow(async_fn_in_trait)]
pub trait MarketplaceDatabase: Clone + OrderManagement + CommissionManagement + NotificationManagement {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Stores a new order and its items atomically, in `pending` status.
    async fn insert_order(&self, order: NewOrder) -> Result<Committed<PlacedOrder>, MarketplaceError>;

    /// Applies `change` with a compare-and-set on the stored status.
    ///
    /// If the stored status is not `change.expected`, nothing is written and [`MarketplaceError::StaleState`] is
    /// returned. When the target is `completed`, one commission per distinct seller is ensured at `rate` before the
    /// transaction commits.
    async fn transition_order(
        &self,
        change: StatusChange,
        rate: CommissionRate,
    ) -> Result<Committed<TransitionResult>, MarketplaceError>;

    /// Insert-or-noop of one commission per distinct seller of a completed order.
    ///
    /// Fails with [`MarketplaceError::CommissionNotTriggered`] if the order is not `completed`.
    async fn ensure_commissions(
        &self,
        order_id: i64,
        rate: CommissionRate,
    ) -> Result<Committed<EnsuredCommissions>, MarketplaceError>;

    async fn insert_payment_proof(&self, proof: NewPaymentProof) -> Result<Committed<PaymentProof>, MarketplaceError>;

    /// Moves the proof from `pending` to `approved` and settles the seller's pending commissions, oldest first, in the
    /// same transaction.
    async fn approve_payment_proof(&self, proof_id: i64)
        -> Result<Committed<ReconciliationReport>, MarketplaceError>;

    async fn reject_payment_proof(
        &self,
        proof_id: i64,
        note: Option<String>,
    ) -> Result<Committed<PaymentProof>, MarketplaceError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), MarketplaceError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum MarketplaceError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(i64),
    #[error("Transition from {from} to {to} is not permitted")]
    InvalidTransition { from: OrderStatusType, to: OrderStatusType },
    #[error("Forbidden: {0}")]
    ForbiddenActor(String),
    #[error("Order {order_id} is {actual}, not {expected}. Re-read the order and try again.")]
    StaleState { order_id: i64, expected: OrderStatusType, actual: OrderStatusType },
    #[error("Invalid order: {0}")]
    InvalidOrder(String),
    #[error("The requested payment proof {0} does not exist")]
    PaymentProofNotFound(i64),
    #[error("Payment proof {id} has already been {status}")]
    PaymentProofAlreadyReviewed { id: i64, status: PaymentProofStatus },
    #[error("Invalid payment proof: {0}")]
    InvalidPaymentProof(String),
    #[error("Order {order_id} is {status}. Commissions are only created for completed orders.")]
    CommissionNotTriggered { order_id: i64, status: OrderStatusType },
    #[error("The requested notification {0} does not exist")]
    NotificationNotFound(i64),
    #[error("Ledger inconsistency: {0}")]
    LedgerInconsistency(String),
}

impl MarketplaceError {
    pub fn forbidden(role: Role, id: &str, reason: &str) -> Self {
        Self::ForbiddenActor(format!("{role} {id} {reason}"))
    }
}

impl From<sqlx::Error> for MarketplaceError {
    fn from(e: sqlx::Error) -> Self {
        MarketplaceError::DatabaseError(e.to_string())
    }
}

impl From<LifecycleError> for MarketplaceError {
    fn from(e: LifecycleError) -> Self {
        match e {
            LifecycleError::InvalidTransition { from, to } => Self::InvalidTransition { from, to },
            e @ LifecycleError::ForbiddenActor { .. } => Self::ForbiddenActor(e.to_string()),
        }
    }
}

impl From<QueryApiError> for MarketplaceError {
    fn from(e: QueryApiError) -> Self {
        match e {
            QueryApiError::DatabaseError(s) => Self::DatabaseError(s),
            QueryApiError::QueryError(s) => Self::DatabaseError(format!("Bad query: {s}")),
        }
    }
}

impl From<NotificationApiError> for MarketplaceError {
    fn from(e: NotificationApiError) -> Self {
        match e {
            NotificationApiError::DatabaseError(s) => Self::DatabaseError(s),
            NotificationApiError::NotificationNotFound(id) => Self::NotificationNotFound(id),
            NotificationApiError::ForbiddenActor(s) => Self::ForbiddenActor(s),
        }
    }
}
