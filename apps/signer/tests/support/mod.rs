pub mod logging;

use std::sync::Arc;

use jwt_signer::config::SiteConfig;

/// Parse a site file in directive form, panicking on errors.
pub fn site(directives: &str) -> Arc<SiteConfig> {
    Arc::new(SiteConfig::from_directives("Signerfile", directives).expect("valid site file"))
}

/// Build the full middleware stack around `routes::configure`, as `main` does.
macro_rules! init_signer_app {
    ($site:expr) => {{
        let site = ::std::sync::Arc::clone(&$site);
        ::actix_web::test::init_service(
            ::actix_web::App::new()
                .wrap(::jwt_signer::middleware::RequestLog)
                .wrap(::jwt_signer::middleware::RequestTrace)
                .configure(move |cfg| ::jwt_signer::routes::configure(cfg, &site)),
        )
        .await
    }};
}
