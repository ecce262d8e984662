//! Templated response headers
//!
//! Sets each configured header on the response, expanding its value with the
//! request's `Replacer` after the inner service has run, so placeholders such
//! as `{http.jwt_signer.digest_str}` published by an outer stage resolve.
//! A header whose value expands to nothing is not set.

use std::sync::Arc;

use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::HeaderValue;
use actix_web::{Error, HttpMessage};
use futures_util::future::{ready, LocalBoxFuture, Ready};
use tracing::{debug, warn};

use crate::config::HeaderTemplate;
use crate::substitution::Replacer;

#[derive(Clone)]
pub struct HeaderInject {
    headers: Arc<Vec<HeaderTemplate>>,
}

impl HeaderInject {
    pub fn new(headers: Arc<Vec<HeaderTemplate>>) -> Self {
        Self { headers }
    }
}

impl<S, B> Transform<S, ServiceRequest> for HeaderInject
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = HeaderInjectMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(HeaderInjectMiddleware {
            service,
            headers: Arc::clone(&self.headers),
        }))
    }
}

pub struct HeaderInjectMiddleware<S> {
    service: S,
    headers: Arc<Vec<HeaderTemplate>>,
}

impl<S, B> Service<ServiceRequest> for HeaderInjectMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let headers = Arc::clone(&self.headers);
        let fut = self.service.call(req);

        Box::pin(async move {
            let mut res = fut.await?;
            if headers.is_empty() {
                return Ok(res);
            }

            let expanded: Option<Vec<_>> =
                res.request().extensions().get::<Replacer>().map(|replacer| {
                    headers
                        .iter()
                        .map(|h| (h.name.clone(), replacer.replace_all(&h.value)))
                        .collect()
                });
            let Some(expanded) = expanded else {
                warn!("no replacer found in request, skipping templated headers");
                return Ok(res);
            };

            for (name, value) in expanded {
                if value.is_empty() {
                    debug!(header = %name, "Header expanded to nothing, not set");
                    continue;
                }
                match HeaderValue::from_str(&value) {
                    Ok(value) => {
                        res.headers_mut().insert(name, value);
                    }
                    Err(_) => warn!(header = %name, "Expanded header value is not valid, not set"),
                }
            }

            Ok(res)
        })
    }
}
