//! Bearer-token authentication extractor.
//!
//! Handlers take a [`CurrentUser`] parameter; extraction resolves the
//! `Authorization` header through the users service, which creates the local
//! account on first sight of a new identity.

use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{FromRequest, HttpRequest, web};
use futures_util::future::LocalBoxFuture;

use super::state::HttpState;
use crate::domain::{Error, User};

/// The authenticated caller.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

fn bearer_token(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|token| token.trim().to_owned())
        .filter(|token| !token.is_empty())
}

impl FromRequest for CurrentUser {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<HttpState>>().cloned();
        let token = bearer_token(req);
        Box::pin(async move {
            let state = state.ok_or_else(|| Error::internal("application state not configured"))?;
            let token = token.ok_or_else(|| Error::unauthorized("missing bearer token"))?;
            let user = state.users.authenticate_bearer(&token).await?;
            Ok(CurrentUser(user))
        })
    }
}
