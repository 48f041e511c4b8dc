#![allow(dead_code)]
use log::*;
use market_engine::{
    db_types::{Actor, NewOrder, NewOrderItem, OrderStatusType},
    events::EventProducers,
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    traits::{PlacedOrder, TransitionResult},
    LedgerApi,
    MarketplaceDatabase,
    NotificationApi,
    OrderFlowApi,
    SettlementApi,
    SqliteDatabase,
};
use mkt_common::{CommissionRate, Money};
use sqlx::{migrate::MigrateDatabase, Sqlite};

/// All four APIs over one fresh database, with a 10% commission rate.
#[derive(Debug)]
pub struct Marketplace {
    pub db: SqliteDatabase,
    pub orders: OrderFlowApi<SqliteDatabase>,
    pub settlement: SettlementApi<SqliteDatabase>,
    pub ledger: LedgerApi<SqliteDatabase>,
    pub notifications: NotificationApi<SqliteDatabase>,
}

impl Marketplace {
    pub async fn new() -> Self {
        Self::with_producers(EventProducers::default()).await
    }

    pub async fn with_producers(producers: EventProducers) -> Self {
        let url = random_db_path();
        let db = prepare_test_env(&url).await;
        let rate = CommissionRate::from_basis_points(1_000).expect("valid rate");
        Self {
            orders: OrderFlowApi::new(db.clone(), producers.clone(), rate),
            settlement: SettlementApi::new(db.clone(), producers.clone()),
            ledger: LedgerApi::new(db.clone()),
            notifications: NotificationApi::new(db.clone(), producers),
            db,
        }
    }

    pub fn db_path(&self) -> &str {
        self.db.url()
    }

    pub async fn tear_down(mut self) {
        let url = self.db.url().to_string();
        if let Err(e) = self.db.close().await {
            error!("🚀️ Failed to close database: {e}");
        }
        if let Err(e) = Sqlite::drop_database(&url).await {
            warn!("🚀️ Could not remove test database {url}: {e}");
        }
    }

    /// Places an order for `buyer` with one line per `(seller, quantity, unit price in minor units)`.
    pub async fn place(&self, buyer: &str, lines: &[(&str, i64, i64)]) -> PlacedOrder {
        let mut order = NewOrder::new(buyer, "1 Main St");
        for (i, (seller, qty, price)) in lines.iter().enumerate() {
            order = order.with_item(NewOrderItem::new(*seller, format!("sku-{i}"), *qty, Money::from(*price)));
        }
        self.orders.place_order(&Actor::buyer(buyer), order).await.expect("Error placing order")
    }

    /// Walks a pending order all the way to `completed`, acting as `seller` for the shipping steps.
    pub async fn complete(&self, order_id: i64, buyer: &str, seller: &str) -> TransitionResult {
        use OrderStatusType::*;
        let seller = Actor::seller(seller);
        for (from, to) in [(Pending, Preparing), (Preparing, InTransit), (InTransit, Delivered)] {
            self.orders.transition(&seller, order_id, from, to).await.expect("Error shipping order");
        }
        self.orders
            .transition(&Actor::buyer(buyer), order_id, Delivered, Completed)
            .await
            .expect("Error completing order")
    }
}
