//! Reusable field validators
//!
//! Each validator receives the field name and its JSON value and returns a
//! human-readable message on failure. Type-specific validators let values of
//! other types pass through; pair them with a type validator.

use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

/// Human-readable form of a field name: `movie_ids` -> `movie ids`
pub fn display_name(field: &str) -> String {
    field.replace('_', " ")
}

/// Read a JSON number or numeric string as an exact decimal
pub fn as_decimal(value: &Value) -> Option<Decimal> {
    let raw = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return None,
    };
    Decimal::from_str(&raw)
        .or_else(|_| Decimal::from_scientific(&raw))
        .ok()
}

/// Validator: field is present and not null, empty string or empty array
pub fn required() -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    |field: &str, value: &Value| {
        let empty = match value {
            Value::Null => true,
            Value::String(s) => s.trim().is_empty(),
            Value::Array(a) => a.is_empty(),
            _ => false,
        };
        if empty {
            Err(format!("The {} field is required.", display_name(field)))
        } else {
            Ok(())
        }
    }
}

/// Validator: value is a string
pub fn string() -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    |field: &str, value: &Value| {
        if value.is_string() {
            Ok(())
        } else {
            Err(format!("The {} field must be a string.", display_name(field)))
        }
    }
}

/// Validator: value is a number or a numeric string
pub fn numeric() -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    |field: &str, value: &Value| {
        if as_decimal(value).is_some() {
            Ok(())
        } else {
            Err(format!("The {} field must be a number.", display_name(field)))
        }
    }
}

/// Validator: value is an array
pub fn array() -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    |field: &str, value: &Value| {
        if value.is_array() {
            Ok(())
        } else {
            Err(format!("The {} field must be an array.", display_name(field)))
        }
    }
}

/// Validator: string length in characters must be within range
pub fn string_length(
    min: usize,
    max: usize,
) -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    move |field: &str, value: &Value| {
        if let Some(s) = value.as_str() {
            let len = s.chars().count();
            if len < min {
                Err(format!(
                    "The {} field must be at least {} characters.",
                    display_name(field),
                    min
                ))
            } else if len > max {
                Err(format!(
                    "The {} field must not be greater than {} characters.",
                    display_name(field),
                    max
                ))
            } else {
                Ok(())
            }
        } else {
            Ok(())
        }
    }
}

/// Validator: number must be at least `min`
pub fn min_value(
    min: Decimal,
) -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    move |field: &str, value: &Value| match as_decimal(value) {
        Some(num) if num < min => Err(format!(
            "The {} field must be at least {}.",
            display_name(field),
            min
        )),
        _ => Ok(()),
    }
}

/// Validator: number must not exceed `max`
pub fn max_value(
    max: Decimal,
) -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    move |field: &str, value: &Value| match as_decimal(value) {
        Some(num) if num > max => Err(format!(
            "The {} field must not be greater than {}.",
            display_name(field),
            max
        )),
        _ => Ok(()),
    }
}

/// Validator: number has at most `places` significant decimal places
///
/// Trailing zeros do not count: `8.750` has two places.
pub fn decimal_places(
    places: u32,
) -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    move |field: &str, value: &Value| match as_decimal(value) {
        Some(num) if num.normalize().scale() > places => Err(format!(
            "The {} field must have at most {} decimal places.",
            display_name(field),
            places
        )),
        _ => Ok(()),
    }
}

/// Validator: value must be in allowed list
pub fn in_list(
    allowed: Vec<String>,
) -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    move |field: &str, value: &Value| {
        let accepted = value
            .as_str()
            .is_some_and(|s| allowed.iter().any(|a| a == s));
        if accepted {
            Ok(())
        } else {
            Err(format!("The selected {} is invalid.", display_name(field)))
        }
    }
}
