//! Bearer-token gate for protected scopes.
//!
//! Wrapped around a scope, [`AuthGate`] pulls `Authorization: Bearer <token>`
//! from each request, verifies it with the [`TokenCodec`] and stores an
//! [`AuthenticatedUser`] in the request extensions. Requests without a valid
//! token never reach the wrapped handlers.

use std::sync::Arc;

use actix_web::body::EitherBody;
use actix_web::dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{self, HeaderValue};
use actix_web::{Error, FromRequest, HttpMessage, HttpRequest};
use futures::future::{ready, LocalBoxFuture, Ready};
use tracing::{debug, warn};

use crate::auth::token::TokenCodec;
use crate::error::{AppError, AuthError};

/// Identity resolved from a verified token, valid for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: i64,
}

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // Only the gate inserts this; a handler outside a gated scope gets 401.
        ready(
            req.extensions()
                .get::<AuthenticatedUser>()
                .copied()
                .ok_or(AppError::AuthError(AuthError::MissingToken)),
        )
    }
}

/// Parses `Bearer <token>`. Any other shape counts as a missing token.
pub fn extract_bearer(header_value: Option<&HeaderValue>) -> Result<&str, AuthError> {
    let value = header_value
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingToken)?;

    let mut parts = value.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case("Bearer") => Ok(token),
        _ => Err(AuthError::MissingToken),
    }
}

pub struct AuthGate {
    tokens: Arc<TokenCodec>,
}

impl AuthGate {
    pub fn new(tokens: Arc<TokenCodec>) -> Self {
        Self { tokens }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthGate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthGateMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthGateMiddleware {
            service,
            tokens: self.tokens.clone(),
        }))
    }
}

pub struct AuthGateMiddleware<S> {
    service: S,
    tokens: Arc<TokenCodec>,
}

impl<S> AuthGateMiddleware<S> {
    fn authenticate(&self, req: &ServiceRequest) -> Result<AuthenticatedUser, AuthError> {
        let token = extract_bearer(req.headers().get(header::AUTHORIZATION))?;
        let user_id = self.tokens.verify(token)?;
        Ok(AuthenticatedUser { user_id })
    }
}

impl<S, B> Service<ServiceRequest> for AuthGateMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        match self.authenticate(&req) {
            Ok(user) => {
                debug!(user_id = user.user_id, path = req.path(), "Request authorized");
                req.extensions_mut().insert(user);
                let fut = self.service.call(req);
                Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
            }
            Err(kind) => {
                warn!(reason = ?kind, path = req.path(), "Rejected request to protected route");
                let response = req
                    .error_response(AppError::AuthError(kind))
                    .map_into_right_body();
                Box::pin(async move { Ok(response) })
            }
        }
    }
}
