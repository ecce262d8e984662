//! Token issuing middleware
//!
//! Runs the configured `jwt_signer` for every request passing through it and
//! publishes the token as `{http.jwt_signer.digest_str}` in the request's
//! `Replacer` before calling the next stage. If issuance fails the request
//! stops here: the error is rendered as the response and nothing is
//! published.

use std::sync::Arc;
use std::time::SystemTime;

use actix_web::body::EitherBody;
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{Error, HttpMessage};
use futures_util::future::{ready, LocalBoxFuture, Ready};
use tracing::debug;

use crate::config::SignerConfig;
use crate::error::AppError;
use crate::issuance::issue_for_request;
use crate::logging::security;
use crate::substitution::{Replacer, RequestValues};

#[derive(Clone)]
pub struct JwtSigner {
    config: Arc<SignerConfig>,
}

impl JwtSigner {
    pub fn new(config: Arc<SignerConfig>) -> Self {
        Self { config }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtSigner
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtSignerMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtSignerMiddleware {
            service,
            config: Arc::clone(&self.config),
        }))
    }
}

pub struct JwtSignerMiddleware<S> {
    service: S,
    config: Arc<SignerConfig>,
}

impl<S, B> Service<ServiceRequest> for JwtSignerMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        debug!(path = %req.path(), query = %req.query_string(), "Run");

        // Without RequestTrace in front there is no Replacer yet.
        if !req.extensions().contains::<Replacer>() {
            let trace_id = req
                .extensions()
                .get::<String>()
                .cloned()
                .unwrap_or_default();
            let replacer =
                Replacer::for_request(RequestValues::from_request(req.request(), &trace_id));
            req.extensions_mut().insert(replacer);
        }

        let outcome = {
            let mut extensions = req.extensions_mut();
            match extensions.get_mut::<Replacer>() {
                Some(replacer) => issue_for_request(&self.config, replacer, SystemTime::now()),
                None => Err(AppError::internal("no replacer found in request")),
            }
        };

        match outcome {
            Ok(_) => {
                let fut = self.service.call(req);
                Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
            }
            Err(err) => {
                security::issuance_failed(&err.to_string());
                // Rendered here, inside the request's trace scope.
                let res = req.error_response(err).map_into_right_body();
                Box::pin(async move { Ok(res) })
            }
        }
    }
}
