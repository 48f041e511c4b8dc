use serde::{Deserialize, Serialize};

use crate::{
    commissions::EnsureCommissionResult,
    db_types::{Notification, Order, OrderItem, OrderStatusType},
    realtime::RowChange,
};

/// The result of a committed write, with the notifications it produced and the row changes to publish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Committed<T> {
    pub value: T,
    pub notifications: Vec<Notification>,
    pub changes: Vec<RowChange>,
}

impl<T> Committed<T> {
    pub fn new(value: T, notifications: Vec<Notification>, changes: Vec<RowChange>) -> Self {
        Self { value, notifications, changes }
    }

    /// A write that turned out to be a no-op.
    pub fn unchanged(value: T) -> Self {
        Self { value, notifications: Vec::new(), changes: Vec::new() }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Committed<U> {
        Committed { value: f(self.value), notifications: self.notifications, changes: self.changes }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedOrder {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// A compare-and-set status change. `expected` is the status the caller last observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub order_id: i64,
    pub expected: OrderStatusType,
    pub target: OrderStatusType,
}

impl StatusChange {
    pub fn new(order_id: i64, expected: OrderStatusType, target: OrderStatusType) -> Self {
        Self { order_id, expected, target }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionResult {
    pub old_order: Order,
    pub new_order: Order,
    /// Non-empty only for the commission-triggering transition
    pub commissions: Vec<EnsureCommissionResult>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnsuredCommissions {
    pub order: Order,
    pub results: Vec<EnsureCommissionResult>,
}

impl EnsuredCommissions {
    pub fn created_count(&self) -> usize {
        self.results.iter().filter(|r| r.was_created()).count()
    }
}
