use serde::{Deserialize, Serialize};

use crate::{
    db_types::{Order, PaymentProof},
    reconciliation::ReconciliationReport,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTransitionedEvent {
    pub old_order: Order,
    pub new_order: Order,
}

impl OrderTransitionedEvent {
    pub fn new(old_order: Order, new_order: Order) -> Self {
        Self { old_order, new_order }
    }
}

/// Emitted after an approved payment proof has been reconciled, whether or not any commission was settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionSettledEvent {
    pub report: ReconciliationReport,
}

impl CommissionSettledEvent {
    pub fn new(report: ReconciliationReport) -> Self {
        Self { report }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentProofReviewedEvent {
    pub proof: PaymentProof,
}

impl PaymentProofReviewedEvent {
    pub fn new(proof: PaymentProof) -> Self {
        Self { proof }
    }
}
