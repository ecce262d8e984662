//! Unverified inspection of compact JWS tokens.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::Value;

fn segment(token: &str, index: usize) -> Value {
    let parts: Vec<&str> = token.split('.').collect();
    assert_eq!(parts.len(), 3, "expected three segments in '{token}'");
    let raw = URL_SAFE_NO_PAD
        .decode(parts[index])
        .expect("segment should be base64url without padding");
    serde_json::from_slice(&raw).expect("segment should be JSON")
}

/// The decoded JOSE header.
pub fn header(token: &str) -> Value {
    segment(token, 0)
}

/// The decoded claims, without checking the signature.
pub fn payload(token: &str) -> Value {
    segment(token, 1)
}
