//! Caller identity.
//!
//! Authentication happens upstream. The proxy in front of this server verifies the caller and forwards who they are in
//! two headers, `x-actor-id` and `x-actor-role`. The identity middleware parses them into an [`Actor`] stored in the
//! request extensions, and handlers receive it through the [`AuthenticatedActor`] extractor.
use std::{
    future::{ready, Ready},
    str::FromStr,
};

use actix_web::{dev::Payload, http::header::HeaderMap, FromRequest, HttpMessage, HttpRequest};
use log::*;
use market_engine::db_types::{Actor, Role};
use mkt_common::helpers::non_blank;

use crate::errors::{AuthError, ServerError};

pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

pub fn actor_from_headers(headers: &HeaderMap) -> Result<Actor, AuthError> {
    let read = |name: &'static str| {
        let value = headers.get(name).ok_or(AuthError::MissingHeader(name))?;
        let value = value.to_str().map_err(|e| AuthError::InvalidHeader(name, e.to_string()))?;
        non_blank(value).map(String::from).ok_or(AuthError::MissingHeader(name))
    };
    let id = read(ACTOR_ID_HEADER)?;
    let role = read(ACTOR_ROLE_HEADER)?;
    let role = Role::from_str(&role).map_err(|e| AuthError::InvalidHeader(ACTOR_ROLE_HEADER, e.to_string()))?;
    Ok(Actor::new(id, role))
}

/// The verified actor making the request.
#[derive(Debug, Clone)]
pub struct AuthenticatedActor(pub Actor);

impl FromRequest for AuthenticatedActor {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let actor = req.extensions().get::<Actor>().cloned();
        let result = match actor {
            Some(actor) => Ok(AuthenticatedActor(actor)),
            // Routes outside the identity middleware can still read the headers directly
            None => actor_from_headers(req.headers()).map(AuthenticatedActor).map_err(|e| {
                debug!("💻️ Request without a usable identity. {e}");
                ServerError::from(e)
            }),
        };
        ready(result)
    }
}
