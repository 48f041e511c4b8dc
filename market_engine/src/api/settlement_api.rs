use std::fmt::Debug;

use log::*;
use mkt_common::{helpers::non_blank, Money};

use crate::{
    api::require_role,
    db_types::{Actor, NewPaymentProof, PaymentProof, Role},
    events::{CommissionSettledEvent, EventProducers, PaymentProofReviewedEvent},
    reconciliation::{AllocationStatus, ReconciliationReport},
    traits::{MarketplaceDatabase, MarketplaceError},
};

/// `SettlementApi` manages seller payment proofs and reconciles approved payments against the commission ledger.
pub struct SettlementApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for SettlementApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SettlementApi")
    }
}

impl<B> SettlementApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> SettlementApi<B>
where B: MarketplaceDatabase
{
    /// A seller declares a payment towards their commission debt. Admin review follows.
    pub async fn submit_payment_proof(
        &self,
        actor: &Actor,
        amount_paid: Money,
        reference_code: &str,
    ) -> Result<PaymentProof, MarketplaceError> {
        require_role(actor, Role::Seller, "submit payment proofs")?;
        if !amount_paid.is_positive() {
            return Err(MarketplaceError::InvalidPaymentProof("The amount paid must be positive".into()));
        }
        let reference_code = non_blank(reference_code)
            .ok_or_else(|| MarketplaceError::InvalidPaymentProof("A payment reference is required".into()))?;
        let proof = NewPaymentProof::new(&actor.id, amount_paid, reference_code);
        let committed = self.db.insert_payment_proof(proof).await?;
        debug!("🔄️💰️ Payment proof #{} of {amount_paid} submitted by {actor}", committed.value.id);
        self.producers.publish_row_changes(committed.changes).await;
        Ok(committed.value)
    }

    /// Approves a pending proof and settles the seller's oldest pending commissions that the payment covers in full.
    ///
    /// A payment too small for the oldest debt is still approved and simply settles nothing. The report says how much
    /// was applied, to which commissions, and what was left unallocated.
    pub async fn approve_payment_proof(
        &self,
        actor: &Actor,
        proof_id: i64,
    ) -> Result<ReconciliationReport, MarketplaceError> {
        require_role(actor, Role::Admin, "review payment proofs")?;
        let committed = self.db.approve_payment_proof(proof_id).await?;
        let report = committed.value;
        match report.allocation_status() {
            AllocationStatus::Exact => {
                info!("🔄️💰️ Proof #{proof_id} fully applied to {} commission(s)", report.settled.len())
            },
            AllocationStatus::Incomplete { unallocated } => info!(
                "🔄️💰️ Proof #{proof_id}: {} applied to {} commission(s), {unallocated} unallocated",
                report.applied,
                report.settled.len()
            ),
        }
        self.producers.publish_payment_proof_reviewed(PaymentProofReviewedEvent::new(report.proof.clone())).await;
        self.producers.publish_commission_settled(CommissionSettledEvent::new(report.clone())).await;
        self.producers.publish_row_changes(committed.changes).await;
        Ok(report)
    }

    pub async fn reject_payment_proof(
        &self,
        actor: &Actor,
        proof_id: i64,
        note: Option<&str>,
    ) -> Result<PaymentProof, MarketplaceError> {
        require_role(actor, Role::Admin, "review payment proofs")?;
        let note = note.and_then(non_blank).map(String::from);
        let committed = self.db.reject_payment_proof(proof_id, note).await?;
        info!("🔄️💰️ Proof #{proof_id} rejected by {actor}");
        self.producers.publish_payment_proof_reviewed(PaymentProofReviewedEvent::new(committed.value.clone())).await;
        self.producers.publish_row_changes(committed.changes).await;
        Ok(committed.value)
    }
}
