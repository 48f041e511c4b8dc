//! Marketplace Engine
//!
//! The core of a multi-seller marketplace: orders move through a role-gated lifecycle, completed orders accrue a
//! commission per seller, and sellers settle that debt by submitting payment proofs which an administrator reviews.
//!
//! The library is divided into these sections:
//! 1. Pure domain logic. [`mod@order_lifecycle`] is the status state machine, [`mod@commissions`] computes the per
//!    seller commission of an order, [`mod@reconciliation`] allocates an approved payment oldest-debt-first, and
//!    [`mod@notifications`] decides who hears about which event.
//! 2. Storage. The [`mod@traits`] module defines what a backend must provide, and [`SqliteDatabase`] is the SQLite
//!    implementation. Every write is a single transaction, and status writes are compare-and-set so that concurrent
//!    actors cannot overwrite each other.
//! 3. The public API ([`mod@api`]). Callers should use these rather than the backend directly, since this is where
//!    actors are checked against the order they are acting on.
//!
//! Committed changes are published through the [`mod@events`] hooks, and [`mod@realtime`] describes how consumers
//! keep read models in sync with them.
pub mod api;
pub mod commissions;
pub mod db_types;
pub mod events;
pub mod notifications;
pub mod order_lifecycle;
pub mod realtime;
pub mod reconciliation;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use api::{
    ledger_api::LedgerApi,
    notification_api::NotificationApi,
    order_flow_api::OrderFlowApi,
    order_objects,
    settlement_api::SettlementApi,
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{
    CommissionManagement,
    MarketplaceDatabase,
    MarketplaceError,
    NotificationApiError,
    NotificationManagement,
    OrderManagement,
    QueryApiError,
};
