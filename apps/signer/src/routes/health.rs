use actix_web::{web, HttpResponse};
use serde::Serialize;

use crate::config::SiteConfig;
use crate::error::AppError;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    app_version: &'static str,
    claims: usize,
    headers: usize,
}

async fn health(site: web::Data<SiteConfig>) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        app_version: env!("CARGO_PKG_VERSION"),
        claims: site.signer.claims.len(),
        headers: site.headers.len(),
    }))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("", web::get().to(health));
}
