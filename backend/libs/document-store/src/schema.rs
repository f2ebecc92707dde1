//! Typed boundary between collection structs and raw document fields
//!
//! Collection types derive `Serialize`/`Deserialize` with
//! `#[serde(deny_unknown_fields)]`, so a stored document with an extra field
//! or without a required one fails to decode instead of being defaulted.

use crate::error::SchemaError;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

/// Raw field map of a document
pub type Fields = Map<String, Value>;

/// Serialize a typed document into a field map
pub fn encode<T: Serialize>(path: &str, doc: &T) -> Result<Fields, SchemaError> {
    match serde_json::to_value(doc) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(other) => Err(SchemaError::new(
            path,
            format!("expected an object, got {}", type_name(&other)),
        )),
        Err(e) => Err(SchemaError::new(path, e.to_string())),
    }
}

/// Deserialize a field map into a typed document
pub fn decode<T: DeserializeOwned>(path: &str, fields: &Fields) -> Result<T, SchemaError> {
    serde_json::from_value(Value::Object(fields.clone()))
        .map_err(|e| SchemaError::new(path, e.to_string()))
}

/// Look up a possibly dotted field path (`a.b.c`)
pub fn lookup<'a>(fields: &'a Fields, field: &str) -> Option<&'a Value> {
    let mut parts = field.split('.');
    let first = parts.next()?;
    let mut current = fields.get(first)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
