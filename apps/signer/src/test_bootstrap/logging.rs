#![cfg(test)]

//! Logging for unit tests.
//!
//! Installed once by the `ctor` hook in `lib.rs`. The filter comes from
//! `TEST_LOG`, then `RUST_LOG`, then defaults to `warn`; output goes through
//! the test writer so it is captured per test:
//!
//! ```bash
//! TEST_LOG=jwt_signer=debug cargo test -p jwt-signer -- --nocapture
//! ```

use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

static INITIALIZED: OnceCell<()> = OnceCell::new();

fn filter() -> EnvFilter {
    std::env::var("TEST_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .map(EnvFilter::new)
        .unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Idempotent; a subscriber installed elsewhere first wins.
pub fn init() {
    INITIALIZED.get_or_init(|| {
        let _ = fmt()
            .with_env_filter(filter())
            .with_test_writer()
            .without_time()
            .try_init();
    });
}
