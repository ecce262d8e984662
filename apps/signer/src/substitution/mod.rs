//! Placeholder substitution.
//!
//! Claim templates, the signer's duration and secret, and the downstream
//! stages' header/redirect templates are all plain strings containing
//! `{placeholder}` references. They are resolved per request through a
//! [`SubstitutionContext`], so the claim engine never depends on how a
//! placeholder is actually looked up.

pub mod replacer;
pub mod request;

pub use replacer::Replacer;
pub use request::RequestValues;

/// Per-request placeholder resolver.
pub trait SubstitutionContext {
    /// Expand every placeholder in `template`. Unknown placeholders expand
    /// to the empty string.
    fn expand(&self, template: &str) -> String;

    /// Make `value` available to later stages under `name`.
    fn publish(&mut self, name: &str, value: String);
}
