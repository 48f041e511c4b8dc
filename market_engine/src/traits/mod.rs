//! # Backend contracts
//!
//! The traits a storage backend implements to drive the marketplace engine.
//!
//! * [`MarketplaceDatabase`] is the write side: placing orders, status transitions, commission creation and payment
//!   proof review. Each method is one transaction.
//! * [`OrderManagement`] and [`CommissionManagement`] are read-only query surfaces used by the APIs and by admin
//!   tooling.
//! * [`NotificationManagement`] lets recipients list their notifications and mark them read.
mod commission_management;
mod marketplace_database;
mod notification_management;
mod order_management;

mod data_objects;

pub use commission_management::CommissionManagement;
pub use data_objects::{Committed, EnsuredCommissions, PlacedOrder, StatusChange, TransitionResult};
pub use marketplace_database::{MarketplaceDatabase, MarketplaceError};
pub use notification_management::{NotificationApiError, NotificationManagement};
pub use order_management::{OrderManagement, QueryApiError};
