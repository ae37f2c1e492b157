//! Temporal operator semantics.
//!
//! Both sides are converted to instants first: datetimes pass through,
//! ISO-8601 text is parsed, and numbers are read as milliseconds since
//! the Unix epoch. A missing (null) operand makes the check false.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use time::{Duration, OffsetDateTime};

use crate::types::{EvalError, Value};

/// Convert a runtime value to an instant. `Ok(None)` for null.
pub fn to_instant(v: &Value) -> Result<Option<OffsetDateTime>, EvalError> {
    match v {
        Value::Null => Ok(None),
        Value::DateTime(dt) => Ok(Some(*dt)),
        Value::Text(s) => canon_core::parse_instant(s.trim())
            .map(Some)
            .ok_or_else(|| EvalError::NotAnInstant {
                value: format!("'{}'", s),
            }),
        Value::Number(ms) => from_epoch_millis(*ms).map(Some),
        other => Err(EvalError::NotAnInstant {
            value: other.type_name().to_string(),
        }),
    }
}

/// Instant conversion for loose equality, where failure means "not equal".
pub(crate) fn instant_of(v: &Value) -> Option<OffsetDateTime> {
    to_instant(v).ok().flatten()
}

fn from_epoch_millis(ms: Decimal) -> Result<OffsetDateTime, EvalError> {
    let nanos = ms
        .checked_mul(Decimal::from(1_000_000))
        .and_then(|n| n.trunc().to_i128())
        .ok_or_else(|| EvalError::Overflow {
            message: format!("epoch value {} out of range", ms),
        })?;
    OffsetDateTime::from_unix_timestamp_nanos(nanos).map_err(|e| EvalError::Overflow {
        message: format!("epoch value {}: {}", ms, e),
    })
}

fn to_window(v: &Value) -> Result<Duration, EvalError> {
    match v {
        Value::Duration(d) => Ok(*d),
        other => Err(EvalError::NotADuration {
            value: other.type_name().to_string(),
        }),
    }
}

/// `value BEFORE reference`, strict.
pub fn before(value: &Value, reference: &Value) -> Result<bool, EvalError> {
    match (to_instant(value)?, to_instant(reference)?) {
        (Some(a), Some(b)) => Ok(a < b),
        _ => Ok(false),
    }
}

/// `value AFTER reference`, strict.
pub fn after(value: &Value, reference: &Value) -> Result<bool, EvalError> {
    match (to_instant(value)?, to_instant(reference)?) {
        (Some(a), Some(b)) => Ok(a > b),
        _ => Ok(false),
    }
}

/// `value WITHIN window`: `now - value <= window`.
///
/// Instants in the future satisfy any non-negative window.
pub fn within(value: &Value, window: &Value, now: OffsetDateTime) -> Result<bool, EvalError> {
    let window = to_window(window)?;
    match to_instant(value)? {
        Some(t) => Ok(now - t <= window),
        None => Ok(false),
    }
}

/// `value EXPIRES AFTER window`: `now < value + window`.
pub fn expires_after(
    value: &Value,
    window: &Value,
    now: OffsetDateTime,
) -> Result<bool, EvalError> {
    let window = to_window(window)?;
    let Some(t) = to_instant(value)? else {
        return Ok(false);
    };
    let deadline = t.checked_add(window).ok_or_else(|| EvalError::Overflow {
        message: format!("{} plus {} is out of range", t, window),
    })?;
    Ok(now < deadline)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    const NOW: OffsetDateTime = datetime!(2024-06-01 12:00 UTC);

    fn mins(n: i64) -> Value {
        Value::Duration(Duration::minutes(n))
    }

    #[test]
    fn text_and_epoch_millis_convert() {
        assert_eq!(
            to_instant(&Value::from("2024-06-01T12:00:00Z")).unwrap(),
            Some(NOW)
        );
        assert_eq!(
            to_instant(&Value::from("2024-06-01")).unwrap(),
            Some(datetime!(2024-06-01 0:00 UTC))
        );
        assert_eq!(
            to_instant(&Value::from(1_717_243_200_000i64)).unwrap(),
            Some(NOW)
        );
        assert_eq!(to_instant(&Value::Null).unwrap(), None);
    }

    #[test]
    fn unparseable_text_is_an_error() {
        let err = to_instant(&Value::from("yesterday")).unwrap_err();
        assert!(matches!(err, EvalError::NotAnInstant { .. }));
        assert!(to_instant(&Value::Bool(true)).is_err());
    }

    #[test]
    fn before_and_after_are_strict() {
        let t = Value::DateTime(NOW);
        assert!(!before(&t, &t).unwrap());
        assert!(!after(&t, &t).unwrap());
        assert!(before(&Value::from("2024-05-31"), &t).unwrap());
        assert!(after(&t, &Value::from("2024-05-31")).unwrap());
        assert!(!before(&Value::Null, &t).unwrap());
    }

    #[test]
    fn within_window() {
        let fifteen_ago = Value::DateTime(NOW - Duration::minutes(15));
        let forty_five_ago = Value::DateTime(NOW - Duration::minutes(45));
        let thirty_ago = Value::DateTime(NOW - Duration::minutes(30));
        assert!(within(&fifteen_ago, &mins(30), NOW).unwrap());
        assert!(!within(&forty_five_ago, &mins(30), NOW).unwrap());
        assert!(within(&thirty_ago, &mins(30), NOW).unwrap());
        assert!(!within(&Value::Null, &mins(30), NOW).unwrap());
    }

    #[test]
    fn expiry() {
        let issued = Value::DateTime(NOW - Duration::days(10));
        let thirty_days = Value::Duration(Duration::days(30));
        let five_days = Value::Duration(Duration::days(5));
        assert!(expires_after(&issued, &thirty_days, NOW).unwrap());
        assert!(!expires_after(&issued, &five_days, NOW).unwrap());
        // The deadline itself is already expired.
        let ten_days = Value::Duration(Duration::days(10));
        assert!(!expires_after(&issued, &ten_days, NOW).unwrap());
    }

    #[test]
    fn window_must_be_a_duration() {
        let err = within(&Value::DateTime(NOW), &Value::from(30), NOW).unwrap_err();
        assert!(matches!(err, EvalError::NotADuration { .. }));
    }
}
