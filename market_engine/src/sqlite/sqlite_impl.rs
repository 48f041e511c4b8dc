//! `SqliteDatabase` is the SQLite implementation of the marketplace backend traits.
//!
//! SQLite allows one writer at a time. Write transactions on a handle (and its clones) are serialised by an async
//! mutex so that concurrent flows queue instead of failing with `SQLITE_BUSY`. The status guards in the SQL still
//! decide who wins a race, so the mutex only affects throughput, never correctness. Other processes writing to the
//! same file are covered by the busy timeout.
use std::{fmt::Debug, sync::Arc};

use chrono::Utc;
use log::*;
use mkt_common::{CommissionRate, Money};
use sqlx::{SqliteConnection, SqlitePool};
use tokio::sync::Mutex;

use super::db::{commissions, db_url, new_pool, notifications, orders, payment_proofs, run_migrations};
use crate::{
    api::order_objects::{CommissionQueryFilter, OrderQueryFilter, PaymentProofQueryFilter},
    commissions::{compute_commissions, EnsureCommissionResult},
    db_types::{
        Commission,
        NewOrder,
        NewPaymentProof,
        Notification,
        Order,
        OrderItem,
        OrderStatusType,
        PaymentProof,
        PaymentProofStatus,
        Recipient,
        SellerDebtSummary,
    },
    notifications::{dispatch, distinct_sellers, DomainEvent},
    order_lifecycle::is_commission_trigger,
    realtime::{Row, RowChange},
    reconciliation::{allocate_fifo, ReconciliationReport},
    traits::{
        CommissionManagement,
        Committed,
        EnsuredCommissions,
        MarketplaceDatabase,
        MarketplaceError,
        NotificationApiError,
        NotificationManagement,
        OrderManagement,
        PlacedOrder,
        QueryApiError,
        StatusChange,
        TransitionResult,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
    write_lock: Arc<Mutex<()>>,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({})", self.url)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object, using `MKT_DATABASE_URL` or the default location.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(&url, max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool, write_lock: Arc::new(Mutex::new(())) })
    }

    pub async fn migrate(&self) -> Result<(), MarketplaceError> {
        run_migrations(&self.pool).await.map_err(|e| MarketplaceError::DatabaseError(e.to_string()))
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Inserts one commission per distinct seller, treating an existing row as success.
async fn ensure_commission_rows(
    order: &Order,
    items: &[OrderItem],
    rate: CommissionRate,
    conn: &mut SqliteConnection,
) -> Result<Vec<EnsureCommissionResult>, MarketplaceError> {
    let now = Utc::now();
    let mut results = Vec::new();
    for new_commission in compute_commissions(order.id, items, rate) {
        match commissions::insert_if_absent(&new_commission, now, &mut *conn).await? {
            Some(c) => {
                let (id, amount, seller) = (c.id, c.amount, &c.seller_id);
                info!("🗃️ Commission #{id} of {amount} created for {seller} on order #{}", c.order_id);
                results.push(EnsureCommissionResult::Created(c));
            },
            None => {
                let existing = commissions::fetch_for_order_and_seller(order.id, &new_commission.seller_id, &mut *conn)
                    .await?
                    .ok_or_else(|| {
                        MarketplaceError::LedgerInconsistency(format!(
                            "Commission for order #{} and seller {} conflicts but cannot be read",
                            order.id, new_commission.seller_id
                        ))
                    })?;
                debug!(
                    "🗃️ Duplicate commission skipped: order #{} seller {} already owes commission #{}",
                    order.id, existing.seller_id, existing.id
                );
                results.push(EnsureCommissionResult::AlreadyExists(existing));
            },
        }
    }
    Ok(results)
}

/// Dispatches `commission_created` for the commissions that were actually inserted.
async fn notify_created_commissions(
    results: &[EnsureCommissionResult],
    conn: &mut SqliteConnection,
) -> Result<(Vec<Notification>, Vec<RowChange>), MarketplaceError> {
    let mut pending = Vec::new();
    let mut changes = Vec::new();
    for result in results {
        if let EnsureCommissionResult::Created(c) = result {
            pending.extend(dispatch(&DomainEvent::CommissionCreated { commission: c }));
            changes.push(RowChange::insert(Row::Commission(c.clone())));
        }
    }
    let inserted = notifications::insert_notifications(pending, Utc::now(), conn).await?;
    Ok((inserted, changes))
}

fn notification_changes(notifications: &[Notification]) -> impl Iterator<Item = RowChange> + '_ {
    notifications.iter().map(|n| RowChange::insert(Row::Notification(n.clone())))
}

impl MarketplaceDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_order(&self, order: NewOrder) -> Result<Committed<PlacedOrder>, MarketplaceError> {
        let total = order
            .total_amount()
            .filter(Money::is_positive)
            .ok_or_else(|| MarketplaceError::InvalidOrder("Order total must be positive and representable".into()))?;
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();
        let (order, items) = orders::insert_order(&order, total, now, &mut tx).await?;
        let sellers = distinct_sellers(items.iter().map(|i| i.seller_id.as_str()));
        let notes = dispatch(&DomainEvent::OrderPlaced { order: &order, sellers: &sellers });
        let notes = notifications::insert_notifications(notes, now, &mut tx).await?;
        tx.commit().await?;
        info!("🗃️ Order #{} placed by {} for {}", order.id, order.buyer_id, order.total_amount);
        let mut changes = vec![RowChange::insert(Row::Order(order.clone())).with_sellers(&sellers)];
        changes.extend(items.iter().map(|i| RowChange::insert(Row::OrderItem(i.clone())).with_sellers(&sellers)));
        changes.extend(notification_changes(&notes));
        Ok(Committed::new(PlacedOrder { order, items }, notes, changes))
    }

    async fn transition_order(
        &self,
        change: StatusChange,
        rate: CommissionRate,
    ) -> Result<Committed<TransitionResult>, MarketplaceError> {
        let StatusChange { order_id, expected, target } = change;
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;
        let old_order = orders::fetch_order(order_id, &mut tx).await?.ok_or(MarketplaceError::OrderNotFound(order_id))?;
        if old_order.status != expected {
            debug!("🗃️ Order #{order_id} is {}, caller expected {expected}", old_order.status);
            return Err(MarketplaceError::StaleState { order_id, expected, actual: old_order.status });
        }
        let now = Utc::now();
        let new_order = match orders::compare_and_set_status(order_id, expected, target, now, &mut tx).await? {
            Some(order) => order,
            None => {
                let actual = orders::fetch_order(order_id, &mut tx).await?.map(|o| o.status).unwrap_or(expected);
                return Err(MarketplaceError::StaleState { order_id, expected, actual });
            },
        };
        let items = orders::fetch_order_items(order_id, &mut tx).await?;
        let sellers = distinct_sellers(items.iter().map(|i| i.seller_id.as_str()));
        let order_change = RowChange::update(Row::Order(old_order.clone()), Row::Order(new_order.clone()));
        let mut changes = vec![order_change.with_sellers(&sellers)];

        let notes = dispatch(&DomainEvent::OrderTransitioned { order: &new_order, from: expected, sellers: &sellers });
        let mut notes = notifications::insert_notifications(notes, now, &mut tx).await?;

        let commissions = if is_commission_trigger(target) {
            let results = ensure_commission_rows(&new_order, &items, rate, &mut tx).await?;
            let (created_notes, commission_changes) = notify_created_commissions(&results, &mut tx).await?;
            changes.extend(commission_changes);
            notes.extend(created_notes);
            results
        } else {
            Vec::new()
        };
        tx.commit().await?;
        info!("🗃️ Order #{order_id} moved from {expected} to {target}");
        changes.extend(notification_changes(&notes));
        Ok(Committed::new(TransitionResult { old_order, new_order, commissions }, notes, changes))
    }

    async fn ensure_commissions(
        &self,
        order_id: i64,
        rate: CommissionRate,
    ) -> Result<Committed<EnsuredCommissions>, MarketplaceError> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;
        let order = orders::fetch_order(order_id, &mut tx).await?.ok_or(MarketplaceError::OrderNotFound(order_id))?;
        if order.status != OrderStatusType::Completed {
            return Err(MarketplaceError::CommissionNotTriggered { order_id, status: order.status });
        }
        let items = orders::fetch_order_items(order_id, &mut tx).await?;
        let results = ensure_commission_rows(&order, &items, rate, &mut tx).await?;
        let (notes, mut changes) = notify_created_commissions(&results, &mut tx).await?;
        tx.commit().await?;
        changes.extend(notification_changes(&notes));
        Ok(Committed::new(EnsuredCommissions { order, results }, notes, changes))
    }

    async fn insert_payment_proof(&self, proof: NewPaymentProof) -> Result<Committed<PaymentProof>, MarketplaceError> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();
        let proof = payment_proofs::insert_payment_proof(&proof, now, &mut tx).await?;
        let notes = dispatch(&DomainEvent::PaymentProofSubmitted { proof: &proof });
        let notes = notifications::insert_notifications(notes, now, &mut tx).await?;
        tx.commit().await?;
        let mut changes = vec![RowChange::insert(Row::PaymentProof(proof.clone()))];
        changes.extend(notification_changes(&notes));
        Ok(Committed::new(proof, notes, changes))
    }

    async fn approve_payment_proof(&self, proof_id: i64) -> Result<Committed<ReconciliationReport>, MarketplaceError> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;
        let pending_proof = payment_proofs::fetch_payment_proof(proof_id, &mut tx)
            .await?
            .ok_or(MarketplaceError::PaymentProofNotFound(proof_id))?;
        let now = Utc::now();
        let proof =
            payment_proofs::review_payment_proof(proof_id, PaymentProofStatus::Approved, None, now, &mut tx)
                .await?
                .ok_or(MarketplaceError::PaymentProofAlreadyReviewed { id: proof_id, status: pending_proof.status })?;
        let mut changes = vec![RowChange::update(Row::PaymentProof(pending_proof), Row::PaymentProof(proof.clone()))];

        let pending = commissions::fetch_pending_for_seller(&proof.seller_id, &mut tx).await?;
        let mut allocation = allocate_fifo(pending, proof.amount_paid);
        let mut settled = Vec::with_capacity(allocation.settled.len());
        for before in allocation.settled {
            let after = commissions::mark_paid(before.id, proof.id, now, &mut tx).await?.ok_or_else(|| {
                MarketplaceError::LedgerInconsistency(format!(
                    "Commission #{} was no longer pending while settling proof #{}",
                    before.id, proof.id
                ))
            })?;
            changes.push(RowChange::update(Row::Commission(before), Row::Commission(after.clone())));
            settled.push(after);
        }
        allocation.settled = settled;

        let mut notes = dispatch(&DomainEvent::PaymentProofReviewed { proof: &proof });
        for commission in &allocation.settled {
            notes.extend(dispatch(&DomainEvent::CommissionPaid { commission, proof: &proof }));
        }
        let notes = notifications::insert_notifications(notes, now, &mut tx).await?;
        tx.commit().await?;

        let report = ReconciliationReport::new(proof, allocation);
        info!(
            "🗃️ Payment proof #{proof_id} approved. {} commission(s) settled, {} applied, {} unallocated",
            report.settled.len(),
            report.applied,
            report.unallocated
        );
        changes.extend(notification_changes(&notes));
        Ok(Committed::new(report, notes, changes))
    }

    async fn reject_payment_proof(
        &self,
        proof_id: i64,
        note: Option<String>,
    ) -> Result<Committed<PaymentProof>, MarketplaceError> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;
        let pending_proof = payment_proofs::fetch_payment_proof(proof_id, &mut tx)
            .await?
            .ok_or(MarketplaceError::PaymentProofNotFound(proof_id))?;
        let now = Utc::now();
        let outcome = PaymentProofStatus::Rejected;
        let proof = payment_proofs::review_payment_proof(proof_id, outcome, note.as_deref(), now, &mut tx)
            .await?
            .ok_or(MarketplaceError::PaymentProofAlreadyReviewed { id: proof_id, status: pending_proof.status })?;
        let notes = dispatch(&DomainEvent::PaymentProofReviewed { proof: &proof });
        let notes = notifications::insert_notifications(notes, now, &mut tx).await?;
        tx.commit().await?;
        info!("🗃️ Payment proof #{proof_id} rejected");
        let mut changes = vec![RowChange::update(Row::PaymentProof(pending_proof), Row::PaymentProof(proof.clone()))];
        changes.extend(notification_changes(&notes));
        Ok(Committed::new(proof, notes, changes))
    }

    async fn close(&mut self) -> Result<(), MarketplaceError> {
        self.pool.close().await;
        Ok(())
    }
}

impl OrderManagement for SqliteDatabase {
    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, QueryApiError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, QueryApiError> {
        let mut conn = self.pool.acquire().await?;
        let items = orders::fetch_order_items(order_id, &mut conn).await?;
        Ok(items)
    }

    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, QueryApiError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::search_orders(query, &mut conn).await?;
        Ok(orders)
    }
}

impl CommissionManagement for SqliteDatabase {
    async fn fetch_commission(&self, id: i64) -> Result<Option<Commission>, QueryApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(commissions::fetch_commission(id, &mut conn).await?)
    }

    async fn search_commissions(&self, query: CommissionQueryFilter) -> Result<Vec<Commission>, QueryApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(commissions::search_commissions(query, &mut conn).await?)
    }

    async fn fetch_pending_commissions_for_seller(&self, seller_id: &str) -> Result<Vec<Commission>, QueryApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(commissions::fetch_pending_for_seller(seller_id, &mut conn).await?)
    }

    async fn pending_commissions_by_seller(&self) -> Result<Vec<SellerDebtSummary>, QueryApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(commissions::pending_by_seller(&mut conn).await?)
    }

    async fn paid_total_for_seller(&self, seller_id: &str) -> Result<Money, QueryApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(commissions::paid_total_for_seller(seller_id, &mut conn).await?)
    }

    async fn fetch_payment_proof(&self, id: i64) -> Result<Option<PaymentProof>, QueryApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(payment_proofs::fetch_payment_proof(id, &mut conn).await?)
    }

    async fn search_payment_proofs(&self, query: PaymentProofQueryFilter) -> Result<Vec<PaymentProof>, QueryApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(payment_proofs::search_payment_proofs(query, &mut conn).await?)
    }
}

impl NotificationManagement for SqliteDatabase {
    async fn fetch_notification(&self, id: i64) -> Result<Option<Notification>, NotificationApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(notifications::fetch_notification(id, &mut conn).await?)
    }

    async fn fetch_notifications_for(
        &self,
        recipient: &Recipient,
        unread_only: bool,
    ) -> Result<Vec<Notification>, NotificationApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(notifications::fetch_notifications_for(recipient, unread_only, &mut conn).await?)
    }

    async fn mark_notification_read(&self, id: i64) -> Result<Committed<Notification>, NotificationApiError> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;
        let before = notifications::fetch_notification(id, &mut tx)
            .await?
            .ok_or(NotificationApiError::NotificationNotFound(id))?;
        if before.is_read {
            return Ok(Committed::unchanged(before));
        }
        let after = notifications::mark_read(id, Utc::now(), &mut tx)
            .await?
            .ok_or(NotificationApiError::NotificationNotFound(id))?;
        tx.commit().await?;
        let change = RowChange::update(Row::Notification(before), Row::Notification(after.clone()));
        Ok(Committed::new(after, Vec::new(), vec![change]))
    }
}
