//! Runtime values and their JSON conversions.

use std::collections::BTreeMap;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use super::EvalError;

// ──────────────────────────────────────────────
// Runtime values
// ──────────────────────────────────────────────

/// A value taken from the context, a literal, or a built-in function.
///
/// Numbers are `rust_decimal::Decimal`, never `f64`, so `0.1 + 0.2`-style
/// drift cannot change a compliance outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Missing data. Produced by resolving a path that does not exist.
    Null,
    Bool(bool),
    Number(Decimal),
    Text(String),
    DateTime(OffsetDateTime),
    Duration(time::Duration),
    List(Vec<Value>),
    Record(BTreeMap<String, Value>),
}

impl Value {
    /// Returns a human-readable type name for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Bool(_) => "Bool",
            Value::Number(_) => "Number",
            Value::Text(_) => "Text",
            Value::DateTime(_) => "DateTime",
            Value::Duration(_) => "Duration",
            Value::List(_) => "List",
            Value::Record(_) => "Record",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Truthiness used by bare-variable conditions and consequences.
    /// Empty text, zero, empty collections and null are false.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => !n.is_zero(),
            Value::Text(s) => !s.is_empty(),
            Value::DateTime(_) => true,
            Value::Duration(d) => !d.is_zero(),
            Value::List(items) => !items.is_empty(),
            Value::Record(fields) => !fields.is_empty(),
        }
    }

    /// Text form used by CONTAINS, MATCHES and LIKE.
    pub fn stringify(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.normalize().to_string(),
            Value::Text(s) => s.clone(),
            Value::DateTime(dt) => dt.format(&Rfc3339).unwrap_or_else(|_| dt.to_string()),
            Value::Duration(d) => format_duration(*d),
            Value::List(items) => items
                .iter()
                .map(Value::stringify)
                .collect::<Vec<_>>()
                .join(","),
            Value::Record(_) => self.to_json().to_string(),
        }
    }

    /// Convert a JSON document into a runtime value.
    ///
    /// Strings stay text even when they look like instants; temporal
    /// operators parse them on demand.
    pub fn from_json(v: &serde_json::Value) -> Result<Value, EvalError> {
        Ok(match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => Value::Number(json_number_to_decimal(n)?),
            serde_json::Value::String(s) => Value::Text(s.clone()),
            serde_json::Value::Array(items) => Value::List(
                items
                    .iter()
                    .map(Value::from_json)
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            serde_json::Value::Object(map) => {
                let mut fields = BTreeMap::new();
                for (k, v) in map {
                    fields.insert(k.clone(), Value::from_json(v)?);
                }
                Value::Record(fields)
            }
        })
    }

    /// Render as JSON for evidence output.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => decimal_to_json(*n),
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::DateTime(dt) => serde_json::Value::String(
                dt.format(&Rfc3339).unwrap_or_else(|_| dt.to_string()),
            ),
            Value::Duration(d) => serde_json::Value::String(format_duration(*d)),
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Record(fields) => {
                let mut map = serde_json::Map::new();
                for (k, v) in fields {
                    map.insert(k.clone(), v.to_json());
                }
                serde_json::Value::Object(map)
            }
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(Decimal::from(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(Decimal::from(n))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<OffsetDateTime> for Value {
    fn from(dt: OffsetDateTime) -> Self {
        Value::DateTime(dt)
    }
}

// ──────────────────────────────────────────────
// Helpers
// ──────────────────────────────────────────────

fn json_number_to_decimal(n: &serde_json::Number) -> Result<Decimal, EvalError> {
    if let Some(i) = n.as_i64() {
        return Ok(Decimal::from(i));
    }
    if let Some(u) = n.as_u64() {
        return Ok(Decimal::from(u));
    }
    let text = n.to_string();
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|e| EvalError::InvalidContext {
            message: format!("number {} is out of range: {}", text, e),
        })
}

fn decimal_to_json(d: Decimal) -> serde_json::Value {
    let d = d.normalize();
    if d.scale() == 0 {
        if let Ok(i) = i64::try_from(d) {
            return serde_json::Value::from(i);
        }
    }
    match serde_json::Number::from_str(&d.to_string()) {
        Ok(n) => serde_json::Value::Number(n),
        Err(_) => serde_json::Value::String(d.to_string()),
    }
}

/// Durations render as ISO-8601 durations in whole minutes or seconds.
fn format_duration(d: time::Duration) -> String {
    if d.whole_seconds() % 60 == 0 {
        format!("PT{}M", d.whole_minutes())
    } else {
        format!("PT{}S", d.whole_seconds())
    }
}
