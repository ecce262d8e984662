//! Expansion of a [`ClaimTemplate`] against a request's placeholders.
//!
//! A text claim that expands to the empty string is left out of the result
//! rather than emitted as `""`, and a nested group left with no claims is
//! left out of its parent in turn, all the way up to the root. Downstream
//! consumers rely on this: an absent request attribute means an absent
//! claim. Scalars are never pruned.

use serde_json::{Map, Value};
use tracing::debug;

use super::template::{ClaimNode, ClaimTemplate};
use crate::logging::pii::Redacted;
use crate::substitution::SubstitutionContext;

/// Concrete claims embedded in an issued token.
pub type ClaimsObject = Map<String, Value>;

/// Expand every claim in `template`, pruning claims that come out empty.
///
/// Only reads from `ctx`; never publishes into it.
pub fn expand_claims<C>(template: &ClaimTemplate, ctx: &C) -> ClaimsObject
where
    C: SubstitutionContext + ?Sized,
{
    let mut claims = ClaimsObject::new();

    for (key, node) in template.iter() {
        match node {
            ClaimNode::Text(raw) => {
                let expanded = ctx.expand(raw);
                debug!(
                    claim = %key,
                    value = %Redacted(&expanded),
                    value_config = %raw,
                    "String claim expanded"
                );
                if !expanded.is_empty() {
                    claims.insert(key.to_string(), Value::String(expanded));
                }
            }
            ClaimNode::Nested(child) => {
                debug!(claim = %key, "Descending into nested claims");
                let nested = expand_claims(child, ctx);
                if !nested.is_empty() {
                    claims.insert(key.to_string(), Value::Object(nested));
                }
            }
            ClaimNode::Scalar(value) => {
                claims.insert(key.to_string(), value.clone());
            }
        }
    }

    debug!(length = claims.len(), "Finalized claims level");
    claims
}
