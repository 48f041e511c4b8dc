use std::collections::HashMap;

use cucumber::World;
use market_engine::{reconciliation::ReconciliationReport, MarketplaceError};

use crate::support::Marketplace;

#[derive(Debug, Default, World)]
pub struct MarketWorld {
    pub system: Option<Marketplace>,
    /// Scenario labels for orders and payment proofs, mapped to their database ids
    pub orders: HashMap<String, i64>,
    pub proofs: HashMap<String, i64>,
    pub last_error: Option<MarketplaceError>,
    pub last_report: Option<ReconciliationReport>,
}

impl MarketWorld {
    pub fn market(&self) -> &Marketplace {
        self.system.as_ref().expect("Marketplace not initialised")
    }

    pub fn order_id(&self, label: &str) -> i64 {
        *self.orders.get(label).unwrap_or_else(|| panic!("No order labelled {label}"))
    }

    pub fn proof_id(&self, label: &str) -> i64 {
        *self.proofs.get(label).unwrap_or_else(|| panic!("No payment proof labelled {label}"))
    }

    pub fn record<T>(&mut self, result: Result<T, MarketplaceError>) -> Option<T> {
        match result {
            Ok(v) => {
                self.last_error = None;
                Some(v)
            },
            Err(e) => {
                self.last_error = Some(e);
                None
            },
        }
    }
}

pub fn error_kind(e: &MarketplaceError) -> &'static str {
    match e {
        MarketplaceError::DatabaseError(_) => "DatabaseError",
        MarketplaceError::OrderNotFound(_) => "OrderNotFound",
        MarketplaceError::InvalidTransition { .. } => "InvalidTransition",
        MarketplaceError::ForbiddenActor(_) => "ForbiddenActor",
        MarketplaceError::StaleState { .. } => "StaleState",
        MarketplaceError::InvalidOrder(_) => "InvalidOrder",
        MarketplaceError::PaymentProofNotFound(_) => "PaymentProofNotFound",
        MarketplaceError::PaymentProofAlreadyReviewed { .. } => "PaymentProofAlreadyReviewed",
        MarketplaceError::InvalidPaymentProof(_) => "InvalidPaymentProof",
        MarketplaceError::CommissionNotTriggered { .. } => "CommissionNotTriggered",
        MarketplaceError::NotificationNotFound(_) => "NotificationNotFound",
        MarketplaceError::LedgerInconsistency(_) => "LedgerInconsistency",
    }
}
