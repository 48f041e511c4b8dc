//! # Marketplace server
//!
//! An HTTP surface over the marketplace engine. It is responsible for:
//! * Turning the identity asserted by the upstream auth proxy into an [`market_engine::db_types::Actor`].
//! * Gating each route by role, before the engine applies its own, finer, participation checks.
//! * Mapping engine errors to HTTP status codes.
//! * Wiring the engine's event hooks, including the realtime change feed.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! * `/health`: liveness check.
//! * `/api/orders...`: checkout, order queries and lifecycle transitions.
//! * `/api/commissions...`, `/api/sellers/{id}/paid_total`: the commission ledger.
//! * `/api/payment_proofs...`: payment proof submission and review.
//! * `/api/notifications...`: the caller's notifications.
//! * `/api/snapshot`: the caller's full read scope, for re-syncing read models.
pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod middleware;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
