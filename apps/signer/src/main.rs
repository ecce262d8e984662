use std::sync::Arc;

use actix_web::{App, HttpServer};
use jwt_signer::bin_support::config_app::Config;
use jwt_signer::config::SiteConfig;
use jwt_signer::middleware::{RequestLog, RequestTrace};
use jwt_signer::routes;
use tracing::info;

mod telemetry;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    telemetry::init_tracing();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {e}");
            std::process::exit(1);
        }
    };

    let site = match SiteConfig::load(&config.site_path) {
        Ok(site) => Arc::new(site),
        Err(e) => {
            eprintln!("❌ Failed to load {}: {e}", config.site_path.display());
            std::process::exit(1);
        }
    };

    info!(
        host = %config.host,
        port = config.port,
        site = %config.site_path.display(),
        "Starting JWT signer"
    );

    HttpServer::new(move || {
        App::new()
            .wrap(RequestLog)
            .wrap(RequestTrace)
            .configure(|cfg| routes::configure(cfg, &site))
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
