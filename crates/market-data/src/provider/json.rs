//! Lenient accessors over `serde_json::Value` for payloads whose numeric
//! fields are sometimes strings and sometimes single-element arrays.

use serde_json::Value;

use super::text::{text_to_number, NumberFormat};
use crate::models::AttributeValue;

/// Follows `path` through nested objects.
pub fn at<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |current, key| current.get(key))
}

fn scalar(value: &Value) -> Option<&Value> {
    match value {
        Value::Array(items) => items.first(),
        Value::Null => None,
        other => Some(other),
    }
}

pub fn number(value: &Value, format: NumberFormat) -> Option<f64> {
    match scalar(value)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => text_to_number(s, format),
        _ => None,
    }
}

pub fn text(value: &Value) -> Option<String> {
    match scalar(value)? {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub fn number_at(value: &Value, path: &[&str], format: NumberFormat) -> AttributeValue {
    at(value, path).and_then(|v| number(v, format)).into()
}

pub fn text_at(value: &Value, path: &[&str]) -> AttributeValue {
    at(value, path).and_then(text).into()
}
