//! Identity middleware. Wrap any scope whose routes act on behalf of a caller.
//!
//! The upstream proxy's identity headers are parsed once per request and the resulting [`Actor`] is placed in the
//! request extensions for the ACL middleware and the handlers. Requests without a usable identity are answered with
//! 401 Unauthorized and never reach the handler.
use std::{future::Future, pin::Pin, rc::Rc};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    error::ErrorUnauthorized,
    Error,
    HttpMessage,
};
use futures::future::{ok, Ready};
use log::*;
use market_engine::db_types::Actor;

use crate::auth::actor_from_headers;

#[derive(Default)]
pub struct IdentityMiddlewareFactory;

impl IdentityMiddlewareFactory {
    pub fn new() -> Self {
        Self
    }
}

impl<S, B> Transform<S, ServiceRequest> for IdentityMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = IdentityMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(IdentityMiddlewareService { service: Rc::new(service) })
    }
}

pub struct IdentityMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for IdentityMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        Box::pin(async move {
            let actor = actor_from_headers(req.headers()).map_err(|e| {
                info!("💻️ Rejected request to {} without a usable identity. {e}", req.path());
                ErrorUnauthorized(e.to_string())
            })?;
            trace!("💻️ {} {} by {actor}", req.method(), req.path());
            req.extensions_mut().insert::<Actor>(actor);
            service.call(req).await
        })
    }
}
