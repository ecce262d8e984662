//! The last stage of the pipeline: answers with the configured redirect or
//! body, expanded with the same `Replacer` the signer published into.

use actix_web::http::header;
use actix_web::{web, HttpMessage, HttpRequest, HttpResponse};
use tracing::debug;

use crate::config::{SiteConfig, Terminal};
use crate::error::AppError;
use crate::substitution::{Replacer, RequestValues};

fn expand(req: &HttpRequest, template: &str) -> String {
    if let Some(replacer) = req.extensions().get::<Replacer>() {
        return replacer.replace_all(template);
    }
    let trace_id = req.extensions().get::<String>().cloned().unwrap_or_default();
    Replacer::for_request(RequestValues::from_request(req, &trace_id)).replace_all(template)
}

pub async fn finish(
    req: HttpRequest,
    site: web::Data<SiteConfig>,
) -> Result<HttpResponse, AppError> {
    match &site.terminal {
        Terminal::Redirect { target, status } => {
            let location = expand(&req, target);
            if location.is_empty() {
                return Err(AppError::precondition(
                    "redirect target empty after replacements",
                ));
            }
            let value = header::HeaderValue::from_str(&location)
                .map_err(|_| AppError::internal("redirect target is not a valid header value"))?;
            debug!(status = status.as_u16(), "Redirecting");
            Ok(HttpResponse::build(*status)
                .insert_header((header::LOCATION, value))
                .finish())
        }
        Terminal::Respond { body, status } => Ok(HttpResponse::build(*status)
            .content_type("text/plain; charset=utf-8")
            .body(expand(&req, body))),
        Terminal::NoContent => Ok(HttpResponse::NoContent().finish()),
    }
}
