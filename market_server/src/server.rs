use std::{future::Future, pin::Pin, time::Duration};

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use market_engine::{
    events::{CommissionSettledEvent, EventHandlers, EventHooks, EventProducers, PaymentProofReviewedEvent},
    realtime::ChangeFeed,
    LedgerApi,
    NotificationApi,
    OrderFlowApi,
    SettlementApi,
    SqliteDatabase,
};

use crate::{
    config::ServerConfig,
    errors::ServerError,
    middleware::IdentityMiddlewareFactory,
    routes::{
        health,
        ApprovePaymentProofRoute,
        CommissionsRoute,
        EnsureCommissionsRoute,
        MarkNotificationReadRoute,
        NotificationsRoute,
        OrderByIdRoute,
        OrdersRoute,
        PaidTotalRoute,
        PaymentProofsRoute,
        PendingBySellerRoute,
        PlaceOrderRoute,
        RejectPaymentProofRoute,
        SnapshotRoute,
        SubmitPaymentProofRoute,
        TransitionOrderRoute,
    },
};

type HookFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, config.db_max_connections)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    if config.run_migrations {
        db.migrate().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
        info!("🚀️ Database migrations are up to date");
    }
    let feed = ChangeFeed::new(config.event_buffer_size);
    let handlers = create_event_handlers(config.event_buffer_size, &feed);
    let producers = handlers.producers();
    handlers.start_handlers();
    let srv = create_server_instance(config, db, producers)?;
    srv.await.map_err(ServerError::from)
}

/// Registers the server's event hooks. Every committed row change goes to the realtime feed; the domain events are
/// logged for the audit trail.
pub fn create_event_handlers(buffer_size: usize, feed: &ChangeFeed) -> EventHandlers {
    let mut hooks = EventHooks::default();
    hooks.on_row_changed(feed.hook());
    hooks.on_order_transitioned(|ev| {
        Box::pin(async move {
            info!("📬️ Order #{} is now {} (was {})", ev.new_order.id, ev.new_order.status, ev.old_order.status);
        }) as HookFuture
    });
    hooks.on_commission_settled(|ev| {
        let CommissionSettledEvent { report } = ev;
        Box::pin(async move {
            info!(
                "📬️ Payment proof #{} from {} settled {} commission(s). Applied {}, unallocated {}",
                report.proof.id,
                report.proof.seller_id,
                report.settled.len(),
                report.applied,
                report.unallocated
            );
        }) as HookFuture
    });
    hooks.on_payment_proof_reviewed(|ev| {
        let PaymentProofReviewedEvent { proof } = ev;
        Box::pin(async move {
            info!("📬️ Payment proof #{} from {} is {}", proof.id, proof.seller_id, proof.status);
        }) as HookFuture
    });
    EventHandlers::new(buffer_size, hooks)
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let commission_rate = config.commission_rate;
    info!("🚀️ Platform commission rate is {commission_rate}");
    let srv = HttpServer::new(move || {
        let orders_api = OrderFlowApi::new(db.clone(), producers.clone(), commission_rate);
        let settlement_api = SettlementApi::new(db.clone(), producers.clone());
        let ledger_api = LedgerApi::new(db.clone());
        let notification_api = NotificationApi::new(db.clone(), producers.clone());
        let api_scope = web::scope("/api")
            .wrap(IdentityMiddlewareFactory::new())
            .service(PlaceOrderRoute::<SqliteDatabase>::new())
            .service(OrdersRoute::<SqliteDatabase>::new())
            .service(OrderByIdRoute::<SqliteDatabase>::new())
            .service(TransitionOrderRoute::<SqliteDatabase>::new())
            .service(EnsureCommissionsRoute::<SqliteDatabase>::new())
            .service(CommissionsRoute::<SqliteDatabase>::new())
            .service(PendingBySellerRoute::<SqliteDatabase>::new())
            .service(PaidTotalRoute::<SqliteDatabase>::new())
            .service(SubmitPaymentProofRoute::<SqliteDatabase>::new())
            .service(PaymentProofsRoute::<SqliteDatabase>::new())
            .service(ApprovePaymentProofRoute::<SqliteDatabase>::new())
            .service(RejectPaymentProofRoute::<SqliteDatabase>::new())
            .service(NotificationsRoute::<SqliteDatabase>::new())
            .service(MarkNotificationReadRoute::<SqliteDatabase>::new())
            .service(SnapshotRoute::<SqliteDatabase>::new());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("market::access_log"))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(settlement_api))
            .app_data(web::Data::new(ledger_api))
            .app_data(web::Data::new(notification_api))
            .service(health)
            .service(api_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
