//! Error codes for the signer's HTTP error responses.
//!
//! Add new codes here; never pass ad-hoc strings as error codes.
//! All error codes are SCREAMING_SNAKE_CASE and map 1:1 to the strings
//! that appear in ProblemDetails bodies.

use core::fmt;

/// Centralized error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Configuration
    /// Site file or claim template is malformed
    ConfigError,

    // Per-request preconditions
    /// A required signer parameter resolved to an empty string
    PreconditionFailed,
    /// The resolved validity duration could not be parsed
    InvalidDuration,

    // Signing
    /// The token could not be signed
    SigningFailed,

    Internal,
}

impl ErrorCode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ConfigError => "CONFIG_ERROR",
            Self::PreconditionFailed => "PRECONDITION_FAILED",
            Self::InvalidDuration => "INVALID_DURATION",
            Self::SigningFailed => "SIGNING_FAILED",
            Self::Internal => "INTERNAL",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
