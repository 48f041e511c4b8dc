use std::fmt::Debug;

use log::*;
use mkt_common::{helpers::non_blank, CommissionRate};

use crate::{
    api::{forbidden, order_objects::OrderWithItems, require_role},
    db_types::{Actor, NewOrder, OrderStatusType, Role},
    events::{EventProducers, OrderTransitionedEvent},
    order_lifecycle::{authorize, LifecycleError},
    traits::{EnsuredCommissions, MarketplaceDatabase, MarketplaceError, PlacedOrder, StatusChange, TransitionResult},
};

/// `OrderFlowApi` places orders and drives them through the lifecycle state machine.
pub struct OrderFlowApi<B> {
    db: B,
    producers: EventProducers,
    commission_rate: CommissionRate,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi (commission rate {})", self.commission_rate)
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, producers: EventProducers, commission_rate: CommissionRate) -> Self {
        Self { db, producers, commission_rate }
    }

    pub fn commission_rate(&self) -> CommissionRate {
        self.commission_rate
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

/// Admins may act on any order. Buyers only on their own, sellers only on orders that contain their items.
pub(crate) fn check_participant(actor: &Actor, order: &OrderWithItems) -> Result<(), MarketplaceError> {
    let allowed = match actor.role {
        Role::Admin => true,
        Role::Buyer => order.order.buyer_id == actor.id,
        Role::Seller => order.has_seller(&actor.id),
    };
    if allowed {
        Ok(())
    } else {
        Err(forbidden(actor, &format!("is not a participant in order #{}", order.order.id)))
    }
}

fn validate_new_order(order: &NewOrder) -> Result<(), MarketplaceError> {
    let invalid = |msg: &str| Err(MarketplaceError::InvalidOrder(msg.to_string()));
    if order.items.is_empty() {
        return invalid("An order needs at least one item");
    }
    if non_blank(&order.delivery_address).is_none() {
        return invalid("The delivery address is blank");
    }
    for item in &order.items {
        if non_blank(&item.seller_id).is_none() || non_blank(&item.product_id).is_none() {
            return invalid("Every item needs a seller and a product");
        }
        if item.quantity <= 0 {
            return invalid("Item quantities must be positive");
        }
        if !item.unit_price.is_positive() {
            return invalid("Item prices must be positive");
        }
    }
    match order.total_amount() {
        Some(total) if total.is_positive() => Ok(()),
        _ => invalid("The order total is out of range"),
    }
}

impl<B> OrderFlowApi<B>
where B: MarketplaceDatabase
{
    /// Checkout intake. Only buyers place orders, and only for themselves.
    pub async fn place_order(&self, actor: &Actor, order: NewOrder) -> Result<PlacedOrder, MarketplaceError> {
        require_role(actor, Role::Buyer, "place orders")?;
        if order.buyer_id != actor.id {
            return Err(forbidden(actor, "may not place an order for another buyer"));
        }
        validate_new_order(&order)?;
        let committed = self.db.insert_order(order).await?;
        debug!("🔄️📦️ Order #{} placed by {actor}", committed.value.order.id);
        self.producers.publish_row_changes(committed.changes).await;
        Ok(committed.value)
    }

    /// Moves order `order_id` from `expected`, the status the actor last saw, to `target`.
    ///
    /// The edge and the actor's role are checked first (`InvalidTransition`, `ForbiddenActor`), then the actor's
    /// participation in the order. The write itself is a compare-and-set, so a caller holding an out-of-date view
    /// gets `StaleState` rather than overwriting a concurrent change. Completing an order creates its commissions
    /// before this call returns.
    pub async fn transition(
        &self,
        actor: &Actor,
        order_id: i64,
        expected: OrderStatusType,
        target: OrderStatusType,
    ) -> Result<TransitionResult, MarketplaceError> {
        authorize(expected, target, actor.role).map_err(|e| {
            if let LifecycleError::ForbiddenActor { .. } = e {
                warn!("🔄️ Forbidden transition on order #{order_id} by {actor}: {e}");
            }
            MarketplaceError::from(e)
        })?;
        let current = self.db.fetch_order_with_items(order_id).await?.ok_or(MarketplaceError::OrderNotFound(order_id))?;
        check_participant(actor, &current)?;
        let change = StatusChange::new(order_id, expected, target);
        let committed = match self.db.transition_order(change, self.commission_rate).await {
            Ok(c) => c,
            Err(e @ MarketplaceError::StaleState { .. }) => {
                info!("🔄️ Transition on order #{order_id} by {actor} lost a race: {e}");
                return Err(e);
            },
            Err(e) => return Err(e),
        };
        let result = committed.value;
        debug!(
            "🔄️📦️ Order #{order_id} moved {expected} -> {target} by {actor}. {} commission(s) ensured",
            result.commissions.len()
        );
        self.producers
            .publish_order_transitioned(OrderTransitionedEvent::new(result.old_order.clone(), result.new_order.clone()))
            .await;
        self.producers.publish_row_changes(committed.changes).await;
        Ok(result)
    }

    /// Re-runs commission creation for a completed order. Admin only.
    ///
    /// Idempotent: commissions that already exist are reported as such and left untouched.
    pub async fn ensure_commissions_for_order(
        &self,
        actor: &Actor,
        order_id: i64,
    ) -> Result<EnsuredCommissions, MarketplaceError> {
        require_role(actor, Role::Admin, "repair commissions")?;
        let committed = self.db.ensure_commissions(order_id, self.commission_rate).await?;
        info!(
            "🔄️💰️ Commissions ensured for order #{order_id}: {} created, {} already present",
            committed.value.created_count(),
            committed.value.results.len() - committed.value.created_count()
        );
        self.producers.publish_row_changes(committed.changes).await;
        Ok(committed.value)
    }
}
