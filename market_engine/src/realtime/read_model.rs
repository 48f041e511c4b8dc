use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    db_types::{Actor, Commission, Notification, Order, PaymentProof, Recipient, Role},
    realtime::{Row, RowChange, RowPredicate, Subscription, Table},
};

/// A row type that can be cached in a [`ReadModel`].
pub trait Versioned: Clone {
    fn row_id(&self) -> i64;
    /// Must strictly increase with every committed update of the row.
    fn row_version(&self) -> i64;
    fn from_row(row: &Row) -> Option<&Self>;
}

macro_rules! versioned {
    ($t:ty, $variant:ident) => {
        impl Versioned for $t {
            fn row_id(&self) -> i64 {
                self.id
            }

            fn row_version(&self) -> i64 {
                self.version()
            }

            fn from_row(row: &Row) -> Option<&Self> {
                match row {
                    Row::$variant(r) => Some(r),
                    _ => None,
                }
            }
        }
    };
}

versioned!(Order, Order);
versioned!(Commission, Commission);
versioned!(PaymentProof, PaymentProof);
versioned!(Notification, Notification);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Inserted,
    Updated,
    /// The local copy is already at this version. Redelivery is expected and harmless.
    Duplicate,
    /// The local copy is newer. The change is discarded.
    Stale,
    /// The change carries a row of another type.
    Ignored,
}

impl MergeOutcome {
    pub fn changed(&self) -> bool {
        matches!(self, Self::Inserted | Self::Updated)
    }
}

/// A local cache of rows, keyed by id, that applies realtime changes idempotently.
#[derive(Debug, Clone)]
pub struct ReadModel<T: Versioned> {
    rows: BTreeMap<i64, T>,
}

impl<T: Versioned> Default for ReadModel<T> {
    fn default() -> Self {
        Self { rows: BTreeMap::new() }
    }
}

impl<T: Versioned> ReadModel<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge(&mut self, change: &RowChange) -> MergeOutcome {
        match T::from_row(&change.after) {
            Some(row) => self.merge_row(row.clone()),
            None => MergeOutcome::Ignored,
        }
    }

    pub fn merge_row(&mut self, row: T) -> MergeOutcome {
        match self.rows.get(&row.row_id()) {
            None => {
                self.rows.insert(row.row_id(), row);
                MergeOutcome::Inserted
            },
            Some(local) if local.row_version() == row.row_version() => MergeOutcome::Duplicate,
            Some(local) if local.row_version() > row.row_version() => MergeOutcome::Stale,
            Some(_) => {
                self.rows.insert(row.row_id(), row);
                MergeOutcome::Updated
            },
        }
    }

    /// Discards the cache and loads `rows`, as on reconnect after the feed was unreachable.
    pub fn replace_all<I: IntoIterator<Item = T>>(&mut self, rows: I) {
        self.rows = rows.into_iter().map(|r| (r.row_id(), r)).collect();
    }

    pub fn get(&self, id: i64) -> Option<&T> {
        self.rows.get(&id)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = &T> {
        self.rows.values()
    }
}

/// Which slice of the shared tables an actor sees.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "scope", content = "id", rename_all = "snake_case")]
pub enum ReadScope {
    Admin,
    Buyer(String),
    Seller(String),
}

impl ReadScope {
    pub fn for_actor(actor: &Actor) -> Self {
        match actor.role {
            Role::Admin => Self::Admin,
            Role::Buyer => Self::Buyer(actor.id.clone()),
            Role::Seller => Self::Seller(actor.id.clone()),
        }
    }

    pub fn recipient(&self) -> Recipient {
        match self {
            Self::Admin => Recipient::admin(),
            Self::Buyer(id) => Recipient::buyer(id),
            Self::Seller(id) => Recipient::seller(id),
        }
    }

    /// The subscriptions that keep this scope's read models current.
    pub fn subscriptions(&self) -> Vec<Subscription> {
        let notifications = Subscription::new(Table::AdminNotifications, RowPredicate::Recipient(self.recipient()));
        match self {
            Self::Admin => vec![
                Subscription::all(Table::Orders),
                Subscription::all(Table::Commissions),
                Subscription::all(Table::SellerPaymentProofs),
                notifications,
            ],
            Self::Buyer(id) => vec![Subscription::new(Table::Orders, RowPredicate::BuyerId(id.clone())), notifications],
            Self::Seller(id) => vec![
                Subscription::new(Table::Orders, RowPredicate::SellerId(id.clone())),
                Subscription::new(Table::Commissions, RowPredicate::SellerId(id.clone())),
                Subscription::new(Table::SellerPaymentProofs, RowPredicate::SellerId(id.clone())),
                notifications,
            ],
        }
    }
}

/// The current rows of a scope, as returned by a full re-fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeSnapshot {
    pub orders: Vec<Order>,
    pub commissions: Vec<Commission>,
    pub payment_proofs: Vec<PaymentProof>,
    pub notifications: Vec<Notification>,
}

/// The full set of read models for one actor.
#[derive(Debug, Clone)]
pub struct ScopedReadModels {
    pub scope: ReadScope,
    pub orders: ReadModel<Order>,
    pub commissions: ReadModel<Commission>,
    pub payment_proofs: ReadModel<PaymentProof>,
    pub notifications: ReadModel<Notification>,
}

impl ScopedReadModels {
    pub fn new(scope: ReadScope) -> Self {
        Self {
            scope,
            orders: ReadModel::new(),
            commissions: ReadModel::new(),
            payment_proofs: ReadModel::new(),
            notifications: ReadModel::new(),
        }
    }

    pub fn apply(&mut self, change: &RowChange) -> MergeOutcome {
        match change.table() {
            Table::Orders => self.orders.merge(change),
            Table::Commissions => self.commissions.merge(change),
            Table::SellerPaymentProofs => self.payment_proofs.merge(change),
            Table::AdminNotifications => self.notifications.merge(change),
            Table::OrderItems => MergeOutcome::Ignored,
        }
    }

    pub fn reload(&mut self, snapshot: ScopeSnapshot) {
        self.orders.replace_all(snapshot.orders);
        self.commissions.replace_all(snapshot.commissions);
        self.payment_proofs.replace_all(snapshot.payment_proofs);
        self.notifications.replace_all(snapshot.notifications);
    }
}
