//! Evaluation context: the caller's data, addressed by dotted paths.

use std::collections::BTreeMap;

use super::{EvalError, Value};

/// Arbitrary nested key/value data a rule is checked against.
///
/// No schema is enforced. A path that does not resolve yields
/// [`Value::Null`] rather than an error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    root: BTreeMap<String, Value>,
}

impl Context {
    pub fn new() -> Self {
        Context::default()
    }

    /// Build a context from a JSON object.
    pub fn from_json(doc: &serde_json::Value) -> Result<Context, EvalError> {
        match Value::from_json(doc)? {
            Value::Record(root) => Ok(Context { root }),
            other => Err(EvalError::InvalidContext {
                message: format!("context must be a JSON object, got {}", other.type_name()),
            }),
        }
    }

    /// Set a top-level key.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.root.insert(key.into(), value);
    }

    /// Resolve a dotted path by sequential key lookup.
    ///
    /// Numeric segments index into lists (`items.0.sku`). The first
    /// missing segment yields `Null`.
    pub fn resolve(&self, path: &str) -> Value {
        let mut segments = path.split('.');
        let Some(first) = segments.next() else {
            return Value::Null;
        };
        let Some(mut current) = self.root.get(first) else {
            return Value::Null;
        };
        for segment in segments {
            let next = match current {
                Value::Record(fields) => fields.get(segment),
                Value::List(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => None,
            };
            match next {
                Some(v) => current = v,
                None => return Value::Null,
            }
        }
        current.clone()
    }

    pub fn to_json(&self) -> serde_json::Value {
        Value::Record(self.root.clone()).to_json()
    }
}
