//! Claim templates as authored in configuration.
//!
//! A template is built once at load time and then only read, so it is shared
//! between workers behind an `Arc` without any locking.

use std::collections::btree_map::{self, BTreeMap};
use std::fmt;

use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use serde_json::{Number, Value};

use crate::AppError;

/// One node of a claim template.
#[derive(Debug, Clone, PartialEq)]
pub enum ClaimNode {
    /// Template string, expanded per request. May contain placeholders.
    Text(String),
    /// Boolean or number, emitted verbatim and never expanded.
    Scalar(Value),
    /// Named sub-claims.
    Nested(ClaimTemplate),
}

/// Mapping from claim name to [`ClaimNode`]. Names are non-empty and unique
/// within one level.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClaimTemplate {
    entries: BTreeMap<String, ClaimNode>,
}

impl ClaimTemplate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a claim, rejecting empty and duplicate names.
    pub fn insert(&mut self, key: impl Into<String>, node: ClaimNode) -> Result<(), AppError> {
        let key = key.into();
        if key.is_empty() {
            return Err(AppError::config("malformed claims: no key found"));
        }

        match self.entries.entry(key) {
            btree_map::Entry::Occupied(entry) => Err(AppError::config(format!(
                "malformed claims: duplicate key {}",
                entry.key()
            ))),
            btree_map::Entry::Vacant(entry) => {
                entry.insert(node);
                Ok(())
            }
        }
    }

    /// Builder-style [`insert`](Self::insert) for a text leaf.
    pub fn with_text(mut self, key: &str, template: &str) -> Result<Self, AppError> {
        self.insert(key, ClaimNode::Text(template.to_string()))?;
        Ok(self)
    }

    pub fn with_nested(mut self, key: &str, nested: ClaimTemplate) -> Result<Self, AppError> {
        if nested.is_empty() {
            return Err(AppError::config(format!("malformed claim {key}: no value")));
        }
        self.insert(key, ClaimNode::Nested(nested))?;
        Ok(self)
    }

    pub fn get(&self, key: &str) -> Option<&ClaimNode> {
        self.entries.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ClaimNode)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Build a template from its JSON form.
    ///
    /// Strings become text leaves, objects nested nodes, booleans, numbers
    /// and `null` scalar leaves. Arrays and empty strings or objects are
    /// rejected.
    pub fn from_json(value: &Value) -> Result<Self, AppError> {
        ClaimTemplate::deserialize(value).map_err(|e| AppError::config(e.to_string()))
    }
}

impl<'de> Deserialize<'de> for ClaimTemplate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(TemplateVisitor)
    }
}

struct TemplateVisitor;

impl<'de> Visitor<'de> for TemplateVisitor {
    type Value = ClaimTemplate;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of claim names to claim values")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut template = ClaimTemplate::new();
        while let Some(key) = map.next_key::<String>()? {
            let node = map
                .next_value::<ClaimNode>()
                .map_err(|e| de::Error::custom(format!("claim {key}: {e}")))?;

            let empty = match &node {
                ClaimNode::Text(s) => s.is_empty(),
                ClaimNode::Nested(t) => t.is_empty(),
                ClaimNode::Scalar(_) => false,
            };
            if empty {
                return Err(de::Error::custom(format!("malformed claim {key}: no value")));
            }

            template
                .insert(key, node)
                .map_err(|e| de::Error::custom(e.detail()))?;
        }
        Ok(template)
    }
}

impl<'de> Deserialize<'de> for ClaimNode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(NodeVisitor)
    }
}

struct NodeVisitor;

impl<'de> Visitor<'de> for NodeVisitor {
    type Value = ClaimNode;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string, boolean, number, null or nested map of claims")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(ClaimNode::Scalar(Value::Null))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(ClaimNode::Text(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
        Ok(ClaimNode::Text(v))
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
        Ok(ClaimNode::Scalar(Value::Bool(v)))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(ClaimNode::Scalar(Value::Number(v.into())))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(ClaimNode::Scalar(Value::Number(v.into())))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Number::from_f64(v)
            .map(|n| ClaimNode::Scalar(Value::Number(n)))
            .ok_or_else(|| E::custom("non-finite number"))
    }

    fn visit_map<A>(self, map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        TemplateVisitor.visit_map(map).map(ClaimNode::Nested)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_from_json_builds_each_node_kind() {
        let template = ClaimTemplate::from_json(&json!({
            "sub": "{user}",
            "admin": true,
            "level": 3,
            "profile": { "name": "{name}" }
        }))
        .unwrap();

        assert_eq!(template.len(), 4);
        assert_eq!(template.get("sub"), Some(&ClaimNode::Text("{user}".into())));
        assert_eq!(template.get("admin"), Some(&ClaimNode::Scalar(json!(true))));
        assert_eq!(template.get("level"), Some(&ClaimNode::Scalar(json!(3))));
        match template.get("profile") {
            Some(ClaimNode::Nested(nested)) => {
                assert_eq!(nested.get("name"), Some(&ClaimNode::Text("{name}".into())));
            }
            other => panic!("expected nested profile, got {other:?}"),
        }
    }

    #[test]
    fn test_null_is_a_scalar_leaf() {
        let template = ClaimTemplate::from_json(&json!({"sub": "{user}", "nick": null})).unwrap();
        assert_eq!(template.get("nick"), Some(&ClaimNode::Scalar(Value::Null)));

        let parsed: ClaimTemplate = serde_json::from_str(r#"{"nick": null}"#).unwrap();
        assert_eq!(parsed.get("nick"), Some(&ClaimNode::Scalar(Value::Null)));
    }

    #[test]
    fn test_construction_is_idempotent() {
        let raw = json!({"a": {"b": {"c": "{x}"}}, "d": 1.5});
        assert_eq!(
            ClaimTemplate::from_json(&raw).unwrap(),
            ClaimTemplate::from_json(&raw).unwrap()
        );
    }

    #[test]
    fn test_rejects_malformed_values() {
        for raw in [
            json!({"": "x"}),
            json!({"sub": ""}),
            json!({"group": {}}),
            json!({"roles": ["a", "b"]}),
            json!("not a map"),
        ] {
            let err = ClaimTemplate::from_json(&raw).unwrap_err();
            assert!(matches!(err, AppError::Config { .. }), "{raw}: {err}");
        }
    }

    #[test]
    fn test_rejects_duplicate_keys_in_json_text() {
        let err = serde_json::from_str::<ClaimTemplate>(r#"{"sub": "a", "sub": "b"}"#)
            .unwrap_err();
        assert!(err.to_string().contains("duplicate key sub"), "{err}");
    }

    #[test]
    fn test_insert_rejects_duplicates_and_empty_keys() {
        let mut template = ClaimTemplate::new();
        template.insert("sub", ClaimNode::Text("a".into())).unwrap();

        assert!(template.insert("sub", ClaimNode::Text("b".into())).is_err());
        assert!(template.insert("", ClaimNode::Text("c".into())).is_err());
        assert_eq!(template.get("sub"), Some(&ClaimNode::Text("a".into())));
    }

    #[test]
    fn test_builder_rejects_empty_nested() {
        let err = ClaimTemplate::new()
            .with_nested("profile", ClaimTemplate::new())
            .unwrap_err();
        assert_eq!(err.detail(), "malformed claim profile: no value");
    }
}
