//! One token issuance, from configured templates to a published token.

use std::time::SystemTime;

use tracing::debug;

use crate::auth::jwt::issue_token;
use crate::claims::expand_claims;
use crate::config::SignerConfig;
use crate::duration::parse_duration;
use crate::logging::security;
use crate::substitution::SubstitutionContext;
use crate::AppError;

/// Name under which the issued token is published for later stages.
pub const TOKEN_PLACEHOLDER: &str = "http.jwt_signer.digest_str";

/// Resolve the signer's parameters through `ctx`, sign the expanded claims
/// and publish the token under [`TOKEN_PLACEHOLDER`].
///
/// Nothing is published unless every step succeeds.
pub fn issue_for_request<C>(
    config: &SignerConfig,
    ctx: &mut C,
    now: SystemTime,
) -> Result<String, AppError>
where
    C: SubstitutionContext + ?Sized,
{
    let duration = ctx.expand(&config.duration);
    let secret = ctx.expand(&config.secret);

    for (name, value) in [("duration", &duration), ("secret", &secret)] {
        if value.is_empty() {
            return Err(AppError::precondition(format!(
                "required parameter empty after replacements: {name}"
            )));
        }
    }

    let valid_for = parse_duration(&duration)?;
    debug!(as_str = %duration, seconds = valid_for.as_secs(), "Parsed duration");

    let claims = expand_claims(&config.claims, &*ctx);
    let claim_names: Vec<String> = claims.keys().cloned().collect();

    let token = issue_token(claims, valid_for, secret.as_bytes(), now)?;
    security::token_issued(&claim_names, valid_for.as_secs());

    ctx.publish(TOKEN_PLACEHOLDER, token.clone());
    Ok(token)
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, UNIX_EPOCH};

    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;
    use serde_json::{json, Value};

    use super::*;
    use crate::claims::ClaimTemplate;
    use crate::errors::ErrorCode;
    use crate::substitution::Replacer;

    fn config(duration: &str, secret: &str) -> SignerConfig {
        SignerConfig::new(
            duration,
            secret,
            ClaimTemplate::from_json(&json!({
                "sub": "{user}",
                "admin": true,
                "profile": {"name": "{name}"}
            }))
            .unwrap(),
        )
    }

    fn payload(token: &str) -> Value {
        let segment = token.split('.').nth(1).unwrap();
        serde_json::from_slice(&URL_SAFE_NO_PAD.decode(segment).unwrap()).unwrap()
    }

    fn at(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(secs)
    }

    #[test]
    fn test_end_to_end_claims_and_window() {
        let mut repl = Replacer::new();
        repl.set("user", "alice");
        repl.set("name", "");
        repl.set("ttl", "15m");

        let token = issue_for_request(&config("{ttl}", "secret"), &mut repl, at(1000)).unwrap();

        assert_eq!(
            payload(&token),
            json!({"sub": "alice", "admin": true, "iat": 1000, "exp": 1900})
        );
        assert_eq!(repl.get(TOKEN_PLACEHOLDER), Some(token));
    }

    #[test]
    fn test_empty_duration_is_precondition_error() {
        let mut repl = Replacer::new();
        let err = issue_for_request(&config("{ttl}", "secret"), &mut repl, at(1000)).unwrap_err();

        assert_eq!(err.code(), ErrorCode::PreconditionFailed);
        assert_eq!(
            err.detail(),
            "required parameter empty after replacements: duration"
        );
        assert_eq!(repl.get(TOKEN_PLACEHOLDER), None);
    }

    #[test]
    fn test_empty_secret_is_precondition_error() {
        let mut repl = Replacer::new();
        let err = issue_for_request(&config("1h", "{env.JWT_SIGNER_UNSET_SECRET}"), &mut repl, at(1))
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::PreconditionFailed);
        assert_eq!(repl.get(TOKEN_PLACEHOLDER), None);
    }

    #[test]
    fn test_unparseable_duration_publishes_nothing() {
        let mut repl = Replacer::new();
        repl.set("ttl", "fifteen minutes");

        let err = issue_for_request(&config("{ttl}", "secret"), &mut repl, at(1)).unwrap_err();

        assert_eq!(err.code(), ErrorCode::InvalidDuration);
        assert_eq!(repl.get(TOKEN_PLACEHOLDER), None);
    }

    #[test]
    fn test_signing_failure_publishes_nothing() {
        let mut repl = Replacer::new();
        let err = issue_for_request(&config("1h", "secret"), &mut repl, UNIX_EPOCH - Duration::from_secs(5))
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::SigningFailed);
        assert_eq!(repl.get(TOKEN_PLACEHOLDER), None);
    }
}
