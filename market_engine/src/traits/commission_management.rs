use mkt_common::Money;

use crate::{
    api::order_objects::{CommissionQueryFilter, PaymentProofQueryFilter},
    db_types::{Commission, PaymentProof, SellerDebtSummary},
    traits::QueryApiError,
};

/// Read-only queries over the commission ledger and the payment proofs sellers submit against it.
#[allow(async_fn_in_trait)]
pub trait CommissionManagement {
    async fn fetch_commission(&self, id: i64) -> Result<Option<Commission>, QueryApiError>;

    async fn search_commissions(&self, query: CommissionQueryFilter) -> Result<Vec<Commission>, QueryApiError>;

    /// The seller's pending commissions, oldest first. This is the order in which payments are allocated.
    async fn fetch_pending_commissions_for_seller(&self, seller_id: &str) -> Result<Vec<Commission>, QueryApiError>;

    /// Pending debt grouped by seller, largest total first.
    async fn pending_commissions_by_seller(&self) -> Result<Vec<SellerDebtSummary>, QueryApiError>;

    /// The sum of the seller's paid commissions. Never decreases.
    async fn paid_total_for_seller(&self, seller_id: &str) -> Result<Money, QueryApiError>;

    async fn fetch_payment_proof(&self, id: i64) -> Result<Option<PaymentProof>, QueryApiError>;

    async fn search_payment_proofs(&self, query: PaymentProofQueryFilter) -> Result<Vec<PaymentProof>, QueryApiError>;
}
