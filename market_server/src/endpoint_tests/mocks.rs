use mkt_common::{CommissionRate, Money};
use market_engine::{
    db_types::{
        Commission,
        NewOrder,
        NewPaymentProof,
        Notification,
        Order,
        OrderItem,
        PaymentProof,
        Recipient,
        SellerDebtSummary,
    },
    order_objects::{CommissionQueryFilter, OrderQueryFilter, PaymentProofQueryFilter},
    reconciliation::ReconciliationReport,
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
use mockall::mock;

mock! {
    pub Backend {}
    impl Clone for Backend {
        fn clone(&self) -> Self;
    }
    impl MarketplaceDatabase for Backend {
        fn url(&self) -> &str;
        async fn insert_order(&self, order: NewOrder) -> Result<Committed<PlacedOrder>, MarketplaceError>;
        async fn transition_order(
            &self,
            change: StatusChange,
            rate: CommissionRate,
        ) -> Result<Committed<TransitionResult>, MarketplaceError>;
        async fn ensure_commissions(
            &self,
            order_id: i64,
            rate: CommissionRate,
        ) -> Result<Committed<EnsuredCommissions>, MarketplaceError>;
        async fn insert_payment_proof(
            &self,
            proof: NewPaymentProof,
        ) -> Result<Committed<PaymentProof>, MarketplaceError>;
        async fn approve_payment_proof(
            &self,
            proof_id: i64,
        ) -> Result<Committed<ReconciliationReport>, MarketplaceError>;
        async fn reject_payment_proof(
            &self,
            proof_id: i64,
            note: Option<String>,
        ) -> Result<Committed<PaymentProof>, MarketplaceError>;
    }
    impl OrderManagement for Backend {
        async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, QueryApiError>;
        async fn fetch_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, QueryApiError>;
        async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, QueryApiError>;
    }
    impl CommissionManagement for Backend {
        async fn fetch_commission(&self, id: i64) -> Result<Option<Commission>, QueryApiError>;
        async fn search_commissions(&self, query: CommissionQueryFilter) -> Result<Vec<Commission>, QueryApiError>;
        async fn fetch_pending_commissions_for_seller(&self, seller_id: &str) -> Result<Vec<Commission>, QueryApiError>;
        async fn pending_commissions_by_seller(&self) -> Result<Vec<SellerDebtSummary>, QueryApiError>;
        async fn paid_total_for_seller(&self, seller_id: &str) -> Result<Money, QueryApiError>;
        async fn fetch_payment_proof(&self, id: i64) -> Result<Option<PaymentProof>, QueryApiError>;
        async fn search_payment_proofs(
            &self,
            query: PaymentProofQueryFilter,
        ) -> Result<Vec<PaymentProof>, QueryApiError>;
    }
    impl NotificationManagement for Backend {
        async fn fetch_notification(&self, id: i64) -> Result<Option<Notification>, NotificationApiError>;
        async fn fetch_notifications_for(
            &self,
            recipient: &Recipient,
            unread_only: bool,
        ) -> Result<Vec<Notification>, NotificationApiError>;
        async fn mark_notification_read(&self, id: i64) -> Result<Committed<Notification>, NotificationApiError>;
    }
}
