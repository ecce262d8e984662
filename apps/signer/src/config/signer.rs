//! The `jwt_signer` directive.

use serde::Deserialize;

use super::directive::Dispenser;
use crate::claims::{ClaimNode, ClaimTemplate};
use crate::duration::parse_duration;
use crate::AppError;

/// Everything the signer needs, as authored. Built once at load time.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SignerConfig {
    /// Validity window template, e.g. `15m` or `{env.TOKEN_TTL}`.
    pub duration: String,
    /// HMAC secret template, e.g. `{env.SIGNER_SECRET}`.
    pub secret: String,
    #[serde(default)]
    pub claims: ClaimTemplate,
}

impl SignerConfig {
    pub fn new(duration: impl Into<String>, secret: impl Into<String>, claims: ClaimTemplate) -> Self {
        Self {
            duration: duration.into(),
            secret: secret.into(),
            claims,
        }
    }

    /// Parse `jwt_signer <duration> <secret> [{ claims }]`. The dispenser
    /// must be positioned on the directive name.
    pub fn from_dispenser(d: &mut Dispenser) -> Result<Self, AppError> {
        let args = d.remaining_args();
        let [duration, secret] = <[String; 2]>::try_from(args).map_err(|_| d.arg_err())?;

        let claims = parse_claims(d)?;
        let config = Self::new(duration, secret, claims);
        config.validate()?;
        Ok(config)
    }

    /// Load-time checks. A duration with no placeholders is parsed right away
    /// so a typo stops startup instead of failing every request.
    pub fn validate(&self) -> Result<(), AppError> {
        for (name, value) in [("duration", &self.duration), ("secret", &self.secret)] {
            if value.is_empty() {
                return Err(AppError::config(format!("missing required parameter: {name}")));
            }
        }

        if !self.duration.contains('{') {
            parse_duration(&self.duration)
                .map_err(|e| AppError::config(format!("jwt_signer: {}", e.detail())))?;
        }

        Ok(())
    }
}

/// Parse a claims block: `key value` lines and `key { ... }` nested blocks.
/// Returns an empty template when there is no block.
pub fn parse_claims(d: &mut Dispenser) -> Result<ClaimTemplate, AppError> {
    let mut claims = ClaimTemplate::new();
    let nesting = d.nesting();

    while d.next_block(nesting) {
        if d.is_block_delimiter() {
            return Err(d.err(format!("malformed claims: unexpected '{}'", d.val())));
        }

        let key = d.val().to_string();
        if key.is_empty() {
            return Err(d.err("malformed claims: no key found"));
        }

        if d.next_arg() {
            let value = d.val().to_string();
            if value.is_empty() {
                return Err(d.err(format!("malformed claim {key}: value is empty")));
            }
            if d.next_arg() {
                return Err(d.err(format!("too many arguments after key: {key}")));
            }

            claims
                .insert(key, ClaimNode::Text(value))
                .map_err(|e| d.err(e.detail()))?;
            continue;
        }

        let nested = parse_claims(d)
            .map_err(|e| AppError::config(format!("nested under key {key}: {}", e.detail())))?;

        if nested.is_empty() {
            return Err(d.err(format!("malformed claim {key}: no value")));
        }

        claims
            .insert(key, ClaimNode::Nested(nested))
            .map_err(|e| d.err(e.detail()))?;
    }

    Ok(claims)
}
