#![deny(clippy::wildcard_imports)]
#![cfg_attr(test, allow(clippy::wildcard_imports))]

pub mod auth;
pub mod bin_support;
pub mod claims;
pub mod config;
pub mod duration;
pub mod error;
pub mod errors;
pub mod issuance;
pub mod logging;
pub mod middleware;
pub mod routes;
pub mod substitution;
pub mod trace_ctx;

#[cfg(test)]
pub mod test_bootstrap;

// Re-exports for public API
pub use auth::jwt::{issue_token, SIGNING_ALGORITHM};
pub use claims::{expand_claims, ClaimNode, ClaimTemplate, ClaimsObject};
pub use config::{HeaderTemplate, SignerConfig, SiteConfig, Terminal};
pub use error::AppError;
pub use errors::ErrorCode;
pub use issuance::{issue_for_request, TOKEN_PLACEHOLDER};
pub use middleware::{HeaderInject, JwtSigner, RequestLog, RequestTrace};
pub use substitution::{Replacer, RequestValues, SubstitutionContext};

// Auto-initialize logging for unit tests
#[cfg(test)]
#[ctor::ctor]
fn init_test_logging() {
    test_bootstrap::logging::init();
}
