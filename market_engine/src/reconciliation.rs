//! # FIFO debt allocation
//!
//! An approved payment proof is applied to the seller's pending commissions, oldest first. Only whole debts are
//! settled: the walk stops at the first commission the remaining amount cannot cover, and everything newer stays
//! pending even if it would fit. Whatever is left over is reported as unallocated and is not carried forward.
use std::fmt::Display;

use mkt_common::Money;
use serde::{Deserialize, Serialize};

use crate::db_types::{Commission, PaymentProof};

/// The result of walking a seller's pending commissions with a given payment amount.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FifoAllocation {
    /// Commissions fully covered by the payment, oldest first.
    pub settled: Vec<Commission>,
    /// Commissions left pending, oldest first.
    pub outstanding: Vec<Commission>,
    pub applied: Money,
    pub unallocated: Money,
}

/// Allocates `payment` across `pending`, oldest debt first.
///
/// The input is sorted by `(created_at, id)` before the walk, so callers need not pre-sort. The id tiebreak keeps
/// the order total when two commissions share a timestamp.
pub fn allocate_fifo(mut pending: Vec<Commission>, payment: Money) -> FifoAllocation {
    pending.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
    let mut remaining = payment;
    let split = pending
        .iter()
        .position(|c| {
            if remaining >= c.amount {
                remaining -= c.amount;
                false
            } else {
                true
            }
        })
        .unwrap_or(pending.len());
    let outstanding = pending.split_off(split);
    FifoAllocation { applied: payment - remaining, unallocated: remaining, settled: pending, outstanding }
}

/// Whether a reconciliation consumed the whole payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AllocationStatus {
    Exact,
    /// Informational, not a failure. Some of the payment could not be applied to a whole debt.
    Incomplete { unallocated: Money },
}

impl Display for AllocationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exact => write!(f, "exact"),
            Self::Incomplete { unallocated } => write!(f, "incomplete ({unallocated} unallocated)"),
        }
    }
}

/// What an admin sees after approving a payment proof: how much was applied and to which commissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationReport {
    pub proof: PaymentProof,
    pub settled: Vec<Commission>,
    pub outstanding: Vec<Commission>,
    pub applied: Money,
    pub unallocated: Money,
}

impl ReconciliationReport {
    pub fn new(proof: PaymentProof, allocation: FifoAllocation) -> Self {
        let FifoAllocation { settled, outstanding, applied, unallocated } = allocation;
        Self { proof, settled, outstanding, applied, unallocated }
    }

    pub fn allocation_status(&self) -> AllocationStatus {
        if self.unallocated.is_zero() {
            AllocationStatus::Exact
        } else {
            AllocationStatus::Incomplete { unallocated: self.unallocated }
        }
    }

    pub fn settled_ids(&self) -> Vec<i64> {
        self.settled.iter().map(|c| c.id).collect()
    }
}
