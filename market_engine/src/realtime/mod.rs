//! # Realtime sync contract
//!
//! The storage backend is the source of truth. Every committed write is described by a [`RowChange`], which is
//! published through the `on_row_changed` event hook. A push transport (out of scope here) delivers these changes to
//! actor sessions that registered a [`Subscription`], i.e. a `(table, predicate)` pair.
//!
//! Delivery is at-least-once and ordered per row only. Consumers keep a [`ReadModel`] per table and merge by row id
//! and version, so duplicates and late deliveries are discarded. When the transport has been unreachable a consumer
//! reloads its [`ReadScope`] from a full [`ScopeSnapshot`] instead.
//!
//! [`ChangeFeed`] is an in-process implementation of the transport side, used by the server and the tests.
mod feed;
mod read_model;
mod subscription;

pub use feed::ChangeFeed;
pub use read_model::{MergeOutcome, ReadModel, ReadScope, ScopeSnapshot, ScopedReadModels, Versioned};
pub use subscription::{Row, RowChange, RowOperation, RowPredicate, Subscription, Table};
