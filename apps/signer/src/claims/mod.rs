//! The claim-template engine: templates, their per-request expansion, and
//! the claims object handed to the token issuer.

pub mod expand;
pub mod template;

pub use expand::{expand_claims, ClaimsObject};
pub use template::{ClaimNode, ClaimTemplate};
