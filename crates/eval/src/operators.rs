//! Comparison, membership and pattern semantics over runtime values.
//!
//! All coercion policy lives here, once:
//!
//! - Equality is loose: numeric text equals its number, `TRUE` equals 1
//!   and the text `true`, an instant equals its ISO text or epoch
//!   milliseconds. `null` equals only `null`.
//! - Ordering is defined for numbers (numeric text included), instants
//!   and durations. A null operand orders false without error; any other
//!   mismatch is [`EvalError::Incomparable`].

use std::cmp::Ordering;
use std::str::FromStr;

use canon_core::CompareOp;
use regex::Regex;
use rust_decimal::Decimal;

use crate::temporal::instant_of;
use crate::types::{EvalError, Value};

// ──────────────────────────────────────────────
// Coercions
// ──────────────────────────────────────────────

fn numeric_text(s: &str) -> Option<Decimal> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

/// Number view used by ordering. Booleans are not ordered.
fn as_number(v: &Value) -> Option<Decimal> {
    match v {
        Value::Number(n) => Some(*n),
        Value::Text(s) => numeric_text(s),
        _ => None,
    }
}

/// Number view used by equality, where booleans count as 1 and 0.
fn as_loose_number(v: &Value) -> Option<Decimal> {
    match v {
        Value::Bool(b) => Some(if *b { Decimal::ONE } else { Decimal::ZERO }),
        other => as_number(other),
    }
}

fn text_bool(s: &str) -> Option<bool> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("true") {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

// ──────────────────────────────────────────────
// Equality and ordering
// ──────────────────────────────────────────────

/// Loose equality. Symmetric; never fails.
pub fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,

        (Value::Text(x), Value::Text(y)) => {
            x == y
                || match (numeric_text(x), numeric_text(y)) {
                    (Some(m), Some(n)) => m == n,
                    _ => false,
                }
        }
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Bool(x), Value::Text(s)) | (Value::Text(s), Value::Bool(x)) => {
            text_bool(s) == Some(*x) || numeric_text(s) == as_loose_number(&Value::Bool(*x))
        }

        (Value::DateTime(x), Value::DateTime(y)) => x == y,
        (Value::DateTime(x), other) | (other, Value::DateTime(x)) => {
            instant_of(other) == Some(*x)
        }

        (Value::Duration(x), Value::Duration(y)) => x == y,

        (Value::List(xs), Value::List(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| loose_eq(x, y))
        }
        (Value::Record(xs), Value::Record(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| loose_eq(x, y)))
        }

        _ => match (as_loose_number(a), as_loose_number(b)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        },
    }
}

/// Order two values. `Ok(None)` when either side is null.
pub fn order(a: &Value, b: &Value) -> Result<Option<Ordering>, EvalError> {
    if a.is_null() || b.is_null() {
        return Ok(None);
    }
    if let (Some(x), Some(y)) = (as_number(a), as_number(b)) {
        return Ok(Some(x.cmp(&y)));
    }
    let temporal = matches!(a, Value::DateTime(_))
        || matches!(b, Value::DateTime(_))
        || matches!((a, b), (Value::Text(_), Value::Text(_)));
    if temporal {
        if let (Some(x), Some(y)) = (instant_of(a), instant_of(b)) {
            return Ok(Some(x.cmp(&y)));
        }
    }
    if let (Value::Duration(x), Value::Duration(y)) = (a, b) {
        return Ok(Some(x.cmp(y)));
    }
    Err(EvalError::Incomparable {
        left: describe(a),
        right: describe(b),
    })
}

fn describe(v: &Value) -> String {
    match v {
        Value::Text(s) => format!("Text '{}'", s),
        Value::List(_) | Value::Record(_) => v.type_name().to_string(),
        other => format!("{} {}", other.type_name(), other.stringify()),
    }
}

/// Apply a comparison operator.
pub fn compare(left: &Value, op: CompareOp, right: &Value) -> Result<bool, EvalError> {
    let holds = |want: fn(Ordering) -> bool| -> Result<bool, EvalError> {
        Ok(order(left, right)?.is_some_and(want))
    };
    match op {
        CompareOp::Eq => Ok(loose_eq(left, right)),
        CompareOp::Neq => Ok(!loose_eq(left, right)),
        CompareOp::Gt => holds(|o| o == Ordering::Greater),
        CompareOp::Gte => holds(|o| o != Ordering::Less),
        CompareOp::Lt => holds(|o| o == Ordering::Less),
        CompareOp::Lte => holds(|o| o != Ordering::Greater),
        CompareOp::Like => like(left, right),
    }
}

// ──────────────────────────────────────────────
// Membership and ranges
// ──────────────────────────────────────────────

/// `value IN values`. An element that resolved to a list contributes its
/// items. `NOT IN` is exactly the negation.
pub fn is_member(value: &Value, values: &[Value]) -> bool {
    values.iter().any(|candidate| match candidate {
        Value::List(items) => {
            loose_eq(value, candidate) || items.iter().any(|item| loose_eq(value, item))
        }
        _ => loose_eq(value, candidate),
    })
}

/// `lower <= value <= upper`. A null anywhere makes it false.
pub fn between(value: &Value, lower: &Value, upper: &Value) -> Result<bool, EvalError> {
    let above = order(value, lower)?;
    let below = order(value, upper)?;
    Ok(matches!(
        (above, below),
        (Some(Ordering::Greater | Ordering::Equal), Some(Ordering::Less | Ordering::Equal))
    ))
}

// ──────────────────────────────────────────────
// Patterns
// ──────────────────────────────────────────────

/// SQL-style `LIKE`: `%` is any run, `_` is one character, everything
/// else is literal, and the whole value must match.
pub fn like(value: &Value, pattern: &Value) -> Result<bool, EvalError> {
    if value.is_null() || pattern.is_null() {
        return Ok(false);
    }
    let raw = pattern.stringify();
    let mut body = String::with_capacity(raw.len() + 8);
    for c in raw.chars() {
        match c {
            '%' => body.push_str(".*"),
            '_' => body.push('.'),
            other => body.push_str(&regex::escape(other.encode_utf8(&mut [0u8; 4]))),
        }
    }
    let re = compile(&format!("(?s)^{}$", body), &raw)?;
    Ok(re.is_match(&value.stringify()))
}

/// `variable CONTAINS pattern`: the variable's text contains the
/// pattern's text. A list variable contains the pattern when any element
/// loosely equals it.
pub fn contains(variable: &Value, pattern: &Value) -> bool {
    match (variable, pattern) {
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::List(items), _) => items.iter().any(|item| loose_eq(item, pattern)),
        _ => variable.stringify().contains(&pattern.stringify()),
    }
}

/// `variable MATCHES pattern`: unanchored regular-expression search.
pub fn matches(variable: &Value, pattern: &Value) -> Result<bool, EvalError> {
    if variable.is_null() || pattern.is_null() {
        return Ok(false);
    }
    let raw = pattern.stringify();
    let re = compile(&raw, &raw)?;
    Ok(re.is_match(&variable.stringify()))
}

fn compile(expr: &str, shown: &str) -> Result<Regex, EvalError> {
    Regex::new(expr).map_err(|e| EvalError::InvalidPattern {
        pattern: shown.to_string(),
        message: e.to_string(),
    })
}
