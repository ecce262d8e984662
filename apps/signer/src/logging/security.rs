use tracing::{info, warn};

use crate::logging::pii::Redacted;
use crate::trace_ctx;

/// Log a successfully issued token. Only the claim names and the validity
/// window are recorded, never the token itself.
pub fn token_issued(claim_names: &[String], valid_for_secs: u64) {
    let trace_id = trace_ctx::trace_id();

    info!(
        event = "SECURITY_TOKEN_ISSUED",
        %trace_id,
        claims = ?claim_names,
        valid_for_secs,
        "Signed token issued"
    );
}

/// Log a request whose token could not be issued.
pub fn issuance_failed(reason: &str) {
    let trace_id = trace_ctx::trace_id();

    warn!(
        event = "SECURITY_TOKEN_ISSUANCE_FAILED",
        %trace_id,
        reason = %Redacted(reason),
        "Token issuance failed"
    );
}
