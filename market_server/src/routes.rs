//! Request handler definitions
//!
//! Define each route and its handler here. Handlers stay thin: read the caller, call the engine API, serialize the
//! result. Anything longer belongs in the engine.
//!
//! Every route under `/api` runs behind the identity middleware, so handlers can take an [`AuthenticatedActor`]
//! directly. The `requires [...]` clause of the [`route!`](crate::route) macro adds a coarse role gate in front of the
//! handler. The engine still checks participation (is this buyer's order, does this order contain this seller's items)
//! on every call.
//!
//! Handlers must not block. Database access is async throughout; keep it that way.
use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use market_engine::{
    db_types::Role,
    order_objects::{CommissionQueryFilter, OrderQueryFilter, PaymentProofQueryFilter},
    traits::{MarketplaceDatabase, NotificationManagement},
    LedgerApi,
    NotificationApi,
    OrderFlowApi,
    SettlementApi,
};

use crate::{
    auth::AuthenticatedActor,
    data_objects::{
        NewOrderRequest,
        NotificationParams,
        OrderSearchParams,
        PaymentProofRequest,
        RejectRequest,
        TransitionRequest,
    },
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:path),+ where requires [$($roles:expr),+]) => {
        paste::paste! { pub struct [<$name:camel Route>]<B>(core::marker::PhantomData<fn() -> B>);}
        paste::paste! { impl<B> [<$name:camel Route>]<B> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> B>)
            }
        }}
        paste::paste! { impl<B> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<B>
        where
            B: $($bounds +)+ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<B>)
                    .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:path),+) => {
        paste::paste! { pub struct [<$name:camel Route>]<B>(core::marker::PhantomData<fn() -> B>);}
        paste::paste! { impl<B> [<$name:camel Route>]<B> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> B>)
            }
        }}
        paste::paste! { impl<B> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<B>
        where
            B: $($bounds +)+ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<B>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(place_order => Post "/orders" impl MarketplaceDatabase where requires [Role::Buyer]);
/// Checkout intake. The buyer is the caller; any buyer id in the body is ignored.
pub async fn place_order<B: MarketplaceDatabase>(
    actor: AuthenticatedActor,
    body: web::Json<NewOrderRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let AuthenticatedActor(actor) = actor;
    debug!("💻️ POST new order for {actor}");
    let order = body.into_inner().into_new_order(&actor.id);
    let placed = api.place_order(&actor, order).await?;
    Ok(HttpResponse::Created().json(placed))
}

route!(orders => Get "/orders" impl MarketplaceDatabase);
pub async fn orders<B: MarketplaceDatabase>(
    actor: AuthenticatedActor,
    params: web::Query<OrderSearchParams>,
    api: web::Data<LedgerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let AuthenticatedActor(actor) = actor;
    let filter = OrderQueryFilter::from(params.into_inner());
    debug!("💻️ GET orders for {actor}. {filter}");
    let orders = api.orders(&actor, filter).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(order_by_id => Get "/orders/{order_id}" impl MarketplaceDatabase);
pub async fn order_by_id<B: MarketplaceDatabase>(
    actor: AuthenticatedActor,
    path: web::Path<i64>,
    api: web::Data<LedgerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let AuthenticatedActor(actor) = actor;
    let order_id = path.into_inner();
    debug!("💻️ GET order #{order_id} for {actor}");
    let order = api.order(&actor, order_id).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(transition_order => Post "/orders/{order_id}/transition" impl MarketplaceDatabase);
/// Moves an order along one edge of the lifecycle. Which edges a caller may take depends on their role, and the engine
/// decides that, so there is no role gate here.
///
/// Returns 409 Conflict if the order is no longer in `expected`.
pub async fn transition_order<B: MarketplaceDatabase>(
    actor: AuthenticatedActor,
    path: web::Path<i64>,
    body: web::Json<TransitionRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let AuthenticatedActor(actor) = actor;
    let order_id = path.into_inner();
    let TransitionRequest { expected, target } = body.into_inner();
    debug!("💻️ POST transition order #{order_id} {expected} -> {target} by {actor}");
    let result = api.transition(&actor, order_id, expected, target).await?;
    Ok(HttpResponse::Ok().json(result))
}

route!(ensure_commissions => Post "/orders/{order_id}/commissions"
    impl MarketplaceDatabase where requires [Role::Admin]);
pub async fn ensure_commissions<B: MarketplaceDatabase>(
    actor: AuthenticatedActor,
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let AuthenticatedActor(actor) = actor;
    let order_id = path.into_inner();
    info!("💻️ POST ensure commissions for order #{order_id} by {actor}");
    let ensured = api.ensure_commissions_for_order(&actor, order_id).await?;
    Ok(HttpResponse::Ok().json(ensured))
}

//----------------------------------------------   Commissions  ----------------------------------------------------
route!(commissions => Get "/commissions" impl MarketplaceDatabase where requires [Role::Seller, Role::Admin]);
pub async fn commissions<B: MarketplaceDatabase>(
    actor: AuthenticatedActor,
    params: web::Query<CommissionQueryFilter>,
    api: web::Data<LedgerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let AuthenticatedActor(actor) = actor;
    debug!("💻️ GET commissions for {actor}");
    let commissions = api.commissions(&actor, params.into_inner()).await?;
    Ok(HttpResponse::Ok().json(commissions))
}

route!(pending_by_seller => Get "/commissions/pending_by_seller" impl MarketplaceDatabase where requires [Role::Admin]);
pub async fn pending_by_seller<B: MarketplaceDatabase>(
    actor: AuthenticatedActor,
    api: web::Data<LedgerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let AuthenticatedActor(actor) = actor;
    debug!("💻️ GET pending commissions by seller for {actor}");
    let summary = api.pending_commissions_by_seller(&actor).await?;
    Ok(HttpResponse::Ok().json(summary))
}

route!(paid_total => Get "/sellers/{seller_id}/paid_total"
    impl MarketplaceDatabase where requires [Role::Seller, Role::Admin]);
pub async fn paid_total<B: MarketplaceDatabase>(
    actor: AuthenticatedActor,
    path: web::Path<String>,
    api: web::Data<LedgerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let AuthenticatedActor(actor) = actor;
    let seller_id = path.into_inner();
    debug!("💻️ GET paid total for {seller_id} by {actor}");
    let total = api.paid_total_for_seller(&actor, &seller_id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "seller_id": seller_id, "paid_total": total })))
}

//----------------------------------------------   Payment proofs  ----------------------------------------------------
route!(submit_payment_proof => Post "/payment_proofs" impl MarketplaceDatabase where requires [Role::Seller]);
pub async fn submit_payment_proof<B: MarketplaceDatabase>(
    actor: AuthenticatedActor,
    body: web::Json<PaymentProofRequest>,
    api: web::Data<SettlementApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let AuthenticatedActor(actor) = actor;
    let PaymentProofRequest { amount_paid, reference_code } = body.into_inner();
    debug!("💻️ POST payment proof of {amount_paid} by {actor}");
    let proof = api.submit_payment_proof(&actor, amount_paid, &reference_code).await?;
    Ok(HttpResponse::Created().json(proof))
}

route!(payment_proofs => Get "/payment_proofs" impl MarketplaceDatabase where requires [Role::Seller, Role::Admin]);
pub async fn payment_proofs<B: MarketplaceDatabase>(
    actor: AuthenticatedActor,
    params: web::Query<PaymentProofQueryFilter>,
    api: web::Data<LedgerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let AuthenticatedActor(actor) = actor;
    debug!("💻️ GET payment proofs for {actor}");
    let proofs = api.payment_proofs(&actor, params.into_inner()).await?;
    Ok(HttpResponse::Ok().json(proofs))
}

route!(approve_payment_proof => Post "/payment_proofs/{proof_id}/approve"
    impl MarketplaceDatabase where requires [Role::Admin]);
/// Approves the proof and reconciles it against the seller's pending commissions, oldest first. The response is the
/// reconciliation report, including any amount left unallocated.
pub async fn approve_payment_proof<B: MarketplaceDatabase>(
    actor: AuthenticatedActor,
    path: web::Path<i64>,
    api: web::Data<SettlementApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let AuthenticatedActor(actor) = actor;
    let proof_id = path.into_inner();
    info!("💻️ POST approve payment proof #{proof_id} by {actor}");
    let report = api.approve_payment_proof(&actor, proof_id).await?;
    Ok(HttpResponse::Ok().json(report))
}

route!(reject_payment_proof => Post "/payment_proofs/{proof_id}/reject"
    impl MarketplaceDatabase where requires [Role::Admin]);
pub async fn reject_payment_proof<B: MarketplaceDatabase>(
    actor: AuthenticatedActor,
    path: web::Path<i64>,
    body: Option<web::Json<RejectRequest>>,
    api: web::Data<SettlementApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let AuthenticatedActor(actor) = actor;
    let proof_id = path.into_inner();
    let note = body.and_then(|b| b.into_inner().note);
    info!("💻️ POST reject payment proof #{proof_id} by {actor}");
    let proof = api.reject_payment_proof(&actor, proof_id, note.as_deref()).await?;
    Ok(HttpResponse::Ok().json(proof))
}

//----------------------------------------------   Notifications  ----------------------------------------------------
route!(notifications => Get "/notifications" impl NotificationManagement);
pub async fn notifications<B: NotificationManagement>(
    actor: AuthenticatedActor,
    params: web::Query<NotificationParams>,
    api: web::Data<NotificationApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let AuthenticatedActor(actor) = actor;
    let unread_only = params.unread_only.unwrap_or(false);
    trace!("💻️ GET notifications for {actor} (unread only: {unread_only})");
    let notifications = api.notifications_for(&actor, unread_only).await?;
    Ok(HttpResponse::Ok().json(notifications))
}

route!(mark_notification_read => Post "/notifications/{notification_id}/read" impl NotificationManagement);
pub async fn mark_notification_read<B: NotificationManagement>(
    actor: AuthenticatedActor,
    path: web::Path<i64>,
    api: web::Data<NotificationApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let AuthenticatedActor(actor) = actor;
    let id = path.into_inner();
    trace!("💻️ POST mark notification #{id} read by {actor}");
    let notification = api.mark_read(&actor, id).await?;
    Ok(HttpResponse::Ok().json(notification))
}

//----------------------------------------------   Snapshot  ----------------------------------------------------
route!(snapshot => Get "/snapshot" impl MarketplaceDatabase);
/// Every row in the caller's read scope. Clients reload their read models from this after losing the change feed.
pub async fn snapshot<B: MarketplaceDatabase>(
    actor: AuthenticatedActor,
    api: web::Data<LedgerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let AuthenticatedActor(actor) = actor;
    debug!("💻️ GET snapshot for {actor}");
    let snapshot = api.snapshot(&actor).await?;
    Ok(HttpResponse::Ok().json(snapshot))
}
