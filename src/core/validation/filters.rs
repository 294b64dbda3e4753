//! Reusable field filters
//!
//! Filters normalize field values before the validators run.

use serde_json::Value;

/// Filter: trim whitespace from string
pub fn trim() -> impl Fn(&str, Value) -> Value + Send + Sync + Clone {
    |_: &str, value: Value| match value {
        Value::String(s) => Value::String(s.trim().to_string()),
        other => other,
    }
}

/// Filter: turn an empty string into null
pub fn empty_to_null() -> impl Fn(&str, Value) -> Value + Send + Sync + Clone {
    |_: &str, value: Value| match value {
        Value::String(s) if s.is_empty() => Value::Null,
        other => other,
    }
}
