//! # Marketplace engine public API
//!
//! The API is split by concern so that clients pick the parts they need:
//!
//! * [`order_flow_api`] places orders and moves them through their lifecycle. Completing an order creates its
//!   commissions in the same transaction.
//! * [`settlement_api`] handles seller payment proofs and reconciles approved payments against pending commissions.
//! * [`ledger_api`] answers read-only queries, always restricted to what the calling actor may see, and builds
//!   read-model snapshots.
//! * [`notification_api`] lists an actor's notifications and marks them read.
//!
//! Every API wraps a backend that implements the traits it needs, e.g.
//!
//! ```rust,ignore
//! use market_engine::{events::EventProducers, OrderFlowApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/marketplace.db", 5).await?;
//! let api = OrderFlowApi::new(db, EventProducers::default(), rate);
//! let result = api.transition(&actor, order_id, OrderStatusType::Pending, OrderStatusType::Preparing).await?;
//! ```
//!
//! Mutating calls take the verified [`Actor`] making the request and enforce both the role gates of the state machine
//! and participation in the order. Rejections are logged at `WARN`.
use log::*;

use crate::{db_types::Actor, traits::MarketplaceError};

pub mod ledger_api;
pub mod notification_api;
pub mod order_flow_api;
pub mod order_objects;
pub mod settlement_api;

pub(crate) fn forbidden(actor: &Actor, reason: &str) -> MarketplaceError {
    warn!("🔄️ Forbidden request by {actor}: {reason}");
    MarketplaceError::forbidden(actor.role, &actor.id, reason)
}

pub(crate) fn require_role(actor: &Actor, role: crate::db_types::Role, action: &str) -> Result<(), MarketplaceError> {
    if actor.role == role {
        Ok(())
    } else {
        Err(forbidden(actor, &format!("may not {action}")))
    }
}
