use std::fmt::Debug;

use log::*;
use mkt_common::Money;

use crate::{
    api::{
        forbidden,
        order_flow_api::check_participant,
        order_objects::{CommissionQueryFilter, OrderQueryFilter, OrderWithItems, PaymentProofQueryFilter},
        require_role,
    },
    db_types::{Actor, Commission, Order, PaymentProof, Role, SellerDebtSummary},
    realtime::{ReadScope, ScopeSnapshot},
    traits::{CommissionManagement, MarketplaceError, NotificationManagement, OrderManagement},
};

/// Read-only queries, each restricted to what the calling actor may see.
pub struct LedgerApi<B> {
    db: B,
}

impl<B> Debug for LedgerApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LedgerApi")
    }
}

impl<B> LedgerApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> LedgerApi<B>
where B: OrderManagement + CommissionManagement + NotificationManagement
{
    pub async fn order(&self, actor: &Actor, order_id: i64) -> Result<OrderWithItems, MarketplaceError> {
        let order = self.db.fetch_order_with_items(order_id).await?.ok_or(MarketplaceError::OrderNotFound(order_id))?;
        check_participant(actor, &order)?;
        Ok(order)
    }

    /// Orders matching `filter`, narrowed to the actor's own orders for buyers and sellers.
    pub async fn orders(&self, actor: &Actor, filter: OrderQueryFilter) -> Result<Vec<Order>, MarketplaceError> {
        let filter = match actor.role {
            Role::Admin => filter,
            Role::Buyer => filter.with_buyer_id(&actor.id),
            Role::Seller => filter.with_seller_id(&actor.id),
        };
        trace!("🔄️ Order search for {actor}: {filter}");
        Ok(self.db.search_orders(filter).await?)
    }

    pub async fn commissions(
        &self,
        actor: &Actor,
        filter: CommissionQueryFilter,
    ) -> Result<Vec<Commission>, MarketplaceError> {
        let filter = match actor.role {
            Role::Admin => filter,
            Role::Seller => filter.with_seller_id(&actor.id),
            Role::Buyer => return Err(forbidden(actor, "may not view commissions")),
        };
        Ok(self.db.search_commissions(filter).await?)
    }

    /// Pending debt grouped by seller, largest first. Admin only.
    pub async fn pending_commissions_by_seller(
        &self,
        actor: &Actor,
    ) -> Result<Vec<SellerDebtSummary>, MarketplaceError> {
        require_role(actor, Role::Admin, "view the debt summary")?;
        Ok(self.db.pending_commissions_by_seller().await?)
    }

    pub async fn paid_total_for_seller(&self, actor: &Actor, seller_id: &str) -> Result<Money, MarketplaceError> {
        if !(actor.is_admin() || (actor.role == Role::Seller && actor.id == seller_id)) {
            return Err(forbidden(actor, "may not view another seller's ledger"));
        }
        Ok(self.db.paid_total_for_seller(seller_id).await?)
    }

    pub async fn payment_proofs(
        &self,
        actor: &Actor,
        filter: PaymentProofQueryFilter,
    ) -> Result<Vec<PaymentProof>, MarketplaceError> {
        let filter = match actor.role {
            Role::Admin => filter,
            Role::Seller => filter.with_seller_id(&actor.id),
            Role::Buyer => return Err(forbidden(actor, "may not view payment proofs")),
        };
        Ok(self.db.search_payment_proofs(filter).await?)
    }

    /// The current rows of the actor's read scope. Consumers reload from this after losing the realtime feed.
    pub async fn snapshot(&self, actor: &Actor) -> Result<ScopeSnapshot, MarketplaceError> {
        let scope = ReadScope::for_actor(actor);
        let notifications = self.db.fetch_notifications_for(&scope.recipient(), false).await?;
        let snapshot = match &scope {
            ReadScope::Admin => ScopeSnapshot {
                orders: self.db.search_orders(OrderQueryFilter::default()).await?,
                commissions: self.db.search_commissions(CommissionQueryFilter::default()).await?,
                payment_proofs: self.db.search_payment_proofs(PaymentProofQueryFilter::default()).await?,
                notifications,
            },
            ReadScope::Buyer(id) => ScopeSnapshot {
                orders: self.db.search_orders(OrderQueryFilter::default().with_buyer_id(id)).await?,
                notifications,
                ..Default::default()
            },
            ReadScope::Seller(id) => ScopeSnapshot {
                orders: self.db.search_orders(OrderQueryFilter::default().with_seller_id(id)).await?,
                commissions: self.db.search_commissions(CommissionQueryFilter::default().with_seller_id(id)).await?,
                payment_proofs: self
                    .db
                    .search_payment_proofs(PaymentProofQueryFilter::default().with_seller_id(id))
                    .await?,
                notifications,
            },
        };
        debug!(
            "🔄️ Snapshot for {actor}: {} orders, {} commissions, {} proofs, {} notifications",
            snapshot.orders.len(),
            snapshot.commissions.len(),
            snapshot.payment_proofs.len(),
            snapshot.notifications.len()
        );
        Ok(snapshot)
    }
}
