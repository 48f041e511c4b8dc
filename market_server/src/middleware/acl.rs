//! Role gate for individual routes.
//!
//! Expects the [`IdentityMiddlewareFactory`](super::IdentityMiddlewareFactory) to have run first. The request is let
//! through if the caller holds any of the route's roles; otherwise a 403 Forbidden response is returned. The engine
//! applies its finer participation checks afterwards.
use std::{future::Future, pin::Pin, rc::Rc};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    error::{ErrorForbidden, ErrorUnauthorized},
    Error,
    HttpMessage,
};
use futures::future::{ok, Ready};
use market_engine::db_types::{Actor, Role};

pub struct AclMiddlewareFactory {
    allowed_roles: Vec<Role>,
}

impl AclMiddlewareFactory {
    pub fn new(allowed_roles: &[Role]) -> Self {
        AclMiddlewareFactory { allowed_roles: allowed_roles.to_vec() }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AclMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AclMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AclMiddlewareService { allowed_roles: self.allowed_roles.clone(), service: Rc::new(service) })
    }
}

pub struct AclMiddlewareService<S> {
    allowed_roles: Vec<Role>,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AclMiddlewareService<S>
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
        let allowed_roles = self.allowed_roles.clone();
        Box::pin(async move {
            let actor = req
                .extensions()
                .get::<Actor>()
                .ok_or_else(|| {
                    log::warn!("💻️ No actor found in request extensions for {}", req.path());
                    ErrorUnauthorized("No caller identity was supplied")
                })?
                .clone();
            if allowed_roles.contains(&actor.role) {
                service.call(req).await
            } else {
                log::warn!("💻️ {actor} may not call {} {}", req.method(), req.path());
                Err(ErrorForbidden("Insufficient permissions."))
            }
        })
    }
}
