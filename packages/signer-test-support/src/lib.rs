//! Test support for the JWT signer
//!
//! Logging initialization, Problem Details assertions and token inspection
//! shared by the signer's integration tests.

pub mod problem_details;
pub mod test_logging;
pub mod token;
