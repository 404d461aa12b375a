//! Value normalization for change detection.
//!
//! Form state and backend records disagree on representation: an untouched
//! optional field may be missing, `null` or `""`; numbers come back as
//! strings; dates carry a time part. Comparison happens on normalized values
//! so none of that registers as a change.

use serde_json::{Number, Value};

use super::schema::FieldKind;
use crate::changes::{classify, ValueClass};
use crate::utils::parse_calendar_day;

/// Whether two field values are the same once normalized for `kind`
pub fn same_value(kind: FieldKind, a: Option<&Value>, b: Option<&Value>) -> bool {
    match (present(a), present(b)) {
        (None, None) => true,
        (Some(_), None) | (None, Some(_)) => false,
        (Some(x), Some(y)) => match kind {
            FieldKind::Text => text_of(x) == text_of(y),
            FieldKind::Number => match (number_of(x), number_of(y)) {
                (Some(p), Some(q)) => p == q,
                _ => text_of(x) == text_of(y),
            },
            FieldKind::Date => match (date_of(x), date_of(y)) {
                (Some(p), Some(q)) => p == q,
                _ => text_of(x) == text_of(y),
            },
            FieldKind::Bool => match (bool_of(x), bool_of(y)) {
                (Some(p), Some(q)) => p == q,
                _ => text_of(x) == text_of(y),
            },
            FieldKind::Any => deep_equal(x, y),
        },
    }
}

/// Convert a changed value into the representation the backend expects.
/// Values that cannot be converted are sent as they are.
pub fn coerce(kind: FieldKind, value: Option<&Value>) -> Value {
    let Some(value) = value else {
        return Value::Null;
    };
    match kind {
        FieldKind::Number => number_of(value).and_then(number_value).unwrap_or_else(|| value.clone()),
        FieldKind::Bool => bool_of(value).map(Value::Bool).unwrap_or_else(|| value.clone()),
        FieldKind::Text | FieldKind::Date | FieldKind::Any => value.clone(),
    }
}

/// The value if it carries anything; blank, null and empty collapse to None
fn present(value: Option<&Value>) -> Option<&Value> {
    match classify(value) {
        ValueClass::EmptyOrAbsent => None,
        _ => value,
    }
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

fn number_of(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        // "NaN" and "inf" parse as floats but are not amounts
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

fn number_value(n: f64) -> Option<Value> {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        Some(Value::from(n as i64))
    } else {
        Number::from_f64(n).map(Value::Number)
    }
}

fn date_of(value: &Value) -> Option<chrono::NaiveDate> {
    value.as_str().and_then(parse_calendar_day)
}

fn bool_of(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn deep_equal(x: &Value, y: &Value) -> bool {
    match (x, y) {
        (Value::Object(a), Value::Object(b)) => a
            .keys()
            .chain(b.keys())
            .all(|key| same_value(FieldKind::Any, a.get(key), b.get(key))),
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len()
                && a.iter()
                    .zip(b.iter())
                    .all(|(p, q)| same_value(FieldKind::Any, Some(p), Some(q)))
        }
        (Value::Object(_) | Value::Array(_), _) | (_, Value::Object(_) | Value::Array(_)) => false,
        _ => text_of(x) == text_of(y),
    }
}
