//! Request entry: assigns the request id and seeds the request's `Replacer`.
//!
//! The id is stored in request extensions as a `String` (read by
//! `RequestLog` and `JwtSigner`), exposed as `{http.request.uuid}`,
//! echoed in `X-Request-Id`, and made the task-local trace id while the
//! inner stages run. Stages that fail render their own error response inside
//! that scope so the ProblemDetails `trace_id` matches the request id.

use std::rc::Rc;

use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header;
use actix_web::HttpMessage;
use futures_util::future::{ready, LocalBoxFuture, Ready};
use uuid::Uuid;

use crate::substitution::{Replacer, RequestValues};
use crate::trace_ctx;

pub struct RequestTrace;

impl<S, B> Transform<S, ServiceRequest> for RequestTrace
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = actix_web::Error;
    type InitError = ();
    type Transform = RequestTraceMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestTraceMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct RequestTraceMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequestTraceMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let trace_id = Uuid::new_v4().to_string();

        // Captured before borrowing extensions mutably: connection info is
        // cached in the same extensions map.
        let replacer = Replacer::for_request(RequestValues::from_request(req.request(), &trace_id));
        {
            let mut extensions = req.extensions_mut();
            extensions.insert(trace_id.clone());
            extensions.insert(replacer);
        }

        let service = Rc::clone(&self.service);
        let scope_id = trace_id.clone();

        Box::pin(async move {
            let mut res =
                trace_ctx::with_trace_id(scope_id, async move { service.call(req).await }).await?;

            res.headers_mut().insert(
                header::HeaderName::from_static("x-request-id"),
                header::HeaderValue::from_str(&trace_id)
                    .unwrap_or_else(|_| header::HeaderValue::from_static("invalid-uuid")),
            );

            Ok(res)
        })
    }
}
