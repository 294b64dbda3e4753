//! Per-payload validation configuration

use crate::core::error::FieldValidationError;
use serde_json::{Map, Value};

type Validator = Box<dyn Fn(&str, &Value) -> Result<(), String> + Send + Sync>;
type Filter = Box<dyn Fn(&str, Value) -> Value + Send + Sync>;

/// Whether a field must be present in the payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Absent fields are validated as null
    Required,
    /// Absent fields are skipped entirely
    Sometimes,
}

struct FieldRules {
    field: String,
    presence: Presence,
    nullable: bool,
    filters: Vec<Filter>,
    validators: Vec<Validator>,
}

/// Filters and validators for the fields of one payload type
///
/// Fields are checked in registration order. Each field reports at most its
/// first failing validator.
pub struct ValidationConfig {
    payload: &'static str,
    fields: Vec<FieldRules>,
}

impl ValidationConfig {
    pub fn new(payload: &'static str) -> Self {
        Self {
            payload,
            fields: Vec::new(),
        }
    }

    pub fn payload(&self) -> &'static str {
        self.payload
    }

    /// Declare a field and its presence rule
    pub fn field(&mut self, field: &str, presence: Presence) -> &mut Self {
        self.fields.push(FieldRules {
            field: field.to_string(),
            presence,
            nullable: false,
            filters: Vec::new(),
            validators: Vec::new(),
        });
        self
    }

    /// Accept null for the most recently declared field
    pub fn nullable(&mut self) -> &mut Self {
        if let Some(rules) = self.fields.last_mut() {
            rules.nullable = true;
        }
        self
    }

    /// Add a filter to the most recently declared field
    pub fn filter<F>(&mut self, filter: F) -> &mut Self
    where
        F: Fn(&str, Value) -> Value + Send + Sync + 'static,
    {
        if let Some(rules) = self.fields.last_mut() {
            rules.filters.push(Box::new(filter));
        }
        self
    }

    /// Add a validator to the most recently declared field
    pub fn validator<V>(&mut self, validator: V) -> &mut Self
    where
        V: Fn(&str, &Value) -> Result<(), String> + Send + Sync + 'static,
    {
        if let Some(rules) = self.fields.last_mut() {
            rules.validators.push(Box::new(validator));
        }
        self
    }

    /// Filter then validate a payload, collecting every field error
    pub fn validate_and_filter(&self, payload: Value) -> Result<Value, Vec<FieldValidationError>> {
        let mut object = match payload {
            Value::Object(map) => map,
            _ => {
                return Err(vec![FieldValidationError::new(
                    "body",
                    format!("The {} payload must be a JSON object.", self.payload),
                )]);
            }
        };

        let mut errors = Vec::new();
        for rules in &self.fields {
            rules.apply(&mut object, &mut errors);
        }

        if errors.is_empty() {
            Ok(Value::Object(object))
        } else {
            Err(errors)
        }
    }
}

impl FieldRules {
    fn apply(&self, object: &mut Map<String, Value>, errors: &mut Vec<FieldValidationError>) {
        let value = match object.remove(&self.field) {
            Some(v) => v,
            None if self.presence == Presence::Sometimes => return,
            None => Value::Null,
        };

        let value = self
            .filters
            .iter()
            .fold(value, |v, filter| filter(&self.field, v));

        if !(value.is_null() && self.nullable) {
            if let Some(message) = self
                .validators
                .iter()
                .find_map(|v| v(&self.field, &value).err())
            {
                errors.push(FieldValidationError::new(self.field.clone(), message));
            }
        }

        object.insert(self.field.clone(), value);
    }
}
