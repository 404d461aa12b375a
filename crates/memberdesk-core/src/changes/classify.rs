//! Semantic classification of JSON field values.
//!
//! Both the change extractor and the patch differ need to decide, for every
//! field, whether it is unset, a plain scalar, a repeated collection or a
//! nested record. That decision is made once here and dispatched with `match`.

use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueClass<'a> {
    /// Missing, null, blank string, empty array, or an object with nothing meaningful in it
    EmptyOrAbsent,
    /// Non-blank string, number or bool
    Scalar(&'a Value),
    /// Non-empty array
    Collection(&'a [Value]),
    /// Object with at least one meaningful property
    Record(&'a Map<String, Value>),
}

pub fn classify(value: Option<&Value>) -> ValueClass<'_> {
    match value {
        None | Some(Value::Null) => ValueClass::EmptyOrAbsent,
        Some(Value::String(s)) if s.trim().is_empty() => ValueClass::EmptyOrAbsent,
        Some(v @ (Value::String(_) | Value::Number(_) | Value::Bool(_))) => ValueClass::Scalar(v),
        Some(Value::Array(items)) if items.is_empty() => ValueClass::EmptyOrAbsent,
        Some(Value::Array(items)) => ValueClass::Collection(items),
        Some(Value::Object(map)) if map.values().any(is_meaningful) => ValueClass::Record(map),
        Some(Value::Object(_)) => ValueClass::EmptyOrAbsent,
    }
}

/// A value is meaningful if it carries something worth showing or sending
pub fn is_meaningful(value: &Value) -> bool {
    is_meaningful_where(value, &|_| false)
}

/// Like `is_meaningful`, but ignores object properties whose key is skipped
pub fn is_meaningful_where(value: &Value, skip: &dyn Fn(&str) -> bool) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Number(_) | Value::Bool(_) => true,
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => map
            .iter()
            .any(|(key, v)| !skip(key) && is_meaningful_where(v, skip)),
    }
}

pub fn is_scalar(value: &Value) -> bool {
    matches!(value, Value::String(_) | Value::Number(_) | Value::Bool(_))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_empty_values() {
        assert_eq!(classify(None), ValueClass::EmptyOrAbsent);
        assert_eq!(classify(Some(&json!(null))), ValueClass::EmptyOrAbsent);
        assert_eq!(classify(Some(&json!("   "))), ValueClass::EmptyOrAbsent);
        assert_eq!(classify(Some(&json!([]))), ValueClass::EmptyOrAbsent);
        assert_eq!(classify(Some(&json!({"a": "", "b": null}))), ValueClass::EmptyOrAbsent);
    }

    #[test]
    fn test_classify_meaningful_values() {
        let zero = json!(0);
        assert_eq!(classify(Some(&zero)), ValueClass::Scalar(&zero));
        let flag = json!(false);
        assert_eq!(classify(Some(&flag)), ValueClass::Scalar(&flag));
        assert!(matches!(classify(Some(&json!([null]))), ValueClass::Collection(items) if items.len() == 1));
        assert!(matches!(classify(Some(&json!({"x": {"y": 1}}))), ValueClass::Record(_)));
    }

    #[test]
    fn test_is_meaningful_where_skips_keys() {
        let value = json!({"id": 4, "updatedAt": "2024-01-01"});
        assert!(is_meaningful(&value));
        assert!(!is_meaningful_where(&value, &|key| key == "id" || key == "updatedAt"));
    }
}
