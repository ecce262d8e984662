use std::collections::HashMap;

use super::{RequestValues, SubstitutionContext};

const ENV_PREFIX: &str = "env.";

/// Resolves `{name}` placeholders for one request.
///
/// Lookup order: values published with [`Replacer::set`], then values
/// captured from the request, then `env.<VAR>` from the process environment.
/// `\{` and `\}` produce literal braces. A `{` without a closing `}` and the
/// empty placeholder `{}` are copied through as written.
#[derive(Debug, Clone, Default)]
pub struct Replacer {
    published: HashMap<String, String>,
    request: Option<RequestValues>,
}

impl Replacer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_request(values: RequestValues) -> Self {
        Self {
            published: HashMap::new(),
            request: Some(values),
        }
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.published.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<String> {
        if let Some(value) = self.published.get(name) {
            return Some(value.clone());
        }

        if let Some(value) = self.request.as_ref().and_then(|r| r.get(name)) {
            return Some(value);
        }

        name.strip_prefix(ENV_PREFIX)
            .filter(|var| !var.is_empty())
            .and_then(|var| std::env::var(var).ok())
    }

    /// Expand all placeholders in `input`.
    pub fn replace_all(&self, input: &str) -> String {
        let mut out = String::with_capacity(input.len());
        let mut rest = input;

        while let Some(pos) = rest.find(['\\', '{']) {
            out.push_str(&rest[..pos]);
            let tail = &rest[pos..];

            if let Some(escaped) = tail.strip_prefix('\\') {
                match escaped.chars().next() {
                    Some(brace @ ('{' | '}')) => {
                        out.push(brace);
                        rest = &escaped[1..];
                    }
                    _ => {
                        out.push('\\');
                        rest = escaped;
                    }
                }
                continue;
            }

            // tail starts with '{'
            let Some(close) = tail.find('}') else {
                out.push_str(tail);
                return out;
            };

            let key = &tail[1..close];
            if key.is_empty() {
                out.push_str("{}");
            } else if let Some(value) = self.get(key) {
                out.push_str(&value);
            }
            rest = &tail[close + 1..];
        }

        out.push_str(rest);
        out
    }
}

impl SubstitutionContext for Replacer {
    fn expand(&self, template: &str) -> String {
        self.replace_all(template)
    }

    fn publish(&mut self, name: &str, value: String) {
        self.set(name, value);
    }
}
