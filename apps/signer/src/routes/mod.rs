use std::sync::Arc;

use actix_web::web;

use crate::config::SiteConfig;
use crate::middleware::{HeaderInject, JwtSigner};

pub mod health;
pub mod terminal;

/// Register the health check and the signing pipeline.
///
/// `/health` is answered without issuing a token. Every other request runs
/// the signer, then the terminal stage, then gets its templated headers.
/// Request-wide middleware (`RequestTrace`, `RequestLog`) is added by the
/// caller on the `App`.
pub fn configure(cfg: &mut web::ServiceConfig, site: &Arc<SiteConfig>) {
    cfg.app_data(web::Data::from(Arc::clone(site)));

    cfg.service(web::scope("/health").configure(health::configure_routes));

    cfg.service(
        web::scope("")
            .wrap(HeaderInject::new(Arc::clone(&site.headers)))
            .wrap(JwtSigner::new(Arc::clone(&site.signer)))
            .default_service(web::to(terminal::finish)),
    );
}
