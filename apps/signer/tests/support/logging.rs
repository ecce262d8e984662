//! Logging for integration test binaries that include `support`.
//!
//! Same precedence as the crate's unit tests: `TEST_LOG`, `RUST_LOG`, `warn`.

#[ctor::ctor]
fn _auto_init_for_integration_tests() {
    signer_test_support::test_logging::init();
}
