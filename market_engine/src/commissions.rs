//! # Commission ledger arithmetic
//!
//! When an order completes, every distinct seller in it owes the platform
//! `round_half_up(seller_subtotal * commission_rate)`. This module computes those debts. Persisting them exactly once
//! is the job of the storage backend, which guards the insert with a unique `(order_id, seller_id)` constraint.
use std::collections::BTreeMap;

use mkt_common::{CommissionRate, Money};
use serde::{Deserialize, Serialize};

use crate::db_types::{Commission, NewCommission, OrderItem};

/// Sums `unit_price * quantity` per seller. The map is ordered by seller id, so iteration order is deterministic.
pub fn seller_subtotals(items: &[OrderItem]) -> BTreeMap<String, Money> {
    items.iter().fold(BTreeMap::new(), |mut acc, item| {
        *acc.entry(item.seller_id.clone()).or_insert_with(Money::zero) += item.subtotal();
        acc
    })
}

/// The commissions owed for `order_id`, one per distinct seller in `items`.
pub fn compute_commissions(order_id: i64, items: &[OrderItem], rate: CommissionRate) -> Vec<NewCommission> {
    seller_subtotals(items)
        .into_iter()
        .map(|(seller_id, subtotal)| NewCommission { order_id, seller_id, amount: rate.apply(subtotal) })
        .collect()
}

/// Outcome of an insert-or-noop for a single `(order_id, seller_id)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", content = "commission", rename_all = "snake_case")]
pub enum EnsureCommissionResult {
    Created(Commission),
    /// The commission already existed. This is the expected result of a retried trigger, not a failure.
    AlreadyExists(Commission),
}

impl EnsureCommissionResult {
    pub fn commission(&self) -> &Commission {
        match self {
            Self::Created(c) | Self::AlreadyExists(c) => c,
        }
    }

    pub fn into_commission(self) -> Commission {
        match self {
            Self::Created(c) | Self::AlreadyExists(c) => c,
        }
    }

    pub fn was_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}
