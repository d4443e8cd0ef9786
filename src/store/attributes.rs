//! Conversion between serde values and DynamoDB items.
//!
//! Rows are modelled as plain serde structs; this module maps their JSON form
//! onto `AttributeValue`s and back so the store never hand-builds items.

use aws_sdk_dynamodb::types::AttributeValue;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Number, Value};
use std::collections::HashMap;

use crate::errors::MailError;

pub type Item = HashMap<String, AttributeValue>;

#[must_use]
pub fn value_to_attribute(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s.clone()),
        Value::Array(items) => AttributeValue::L(items.iter().map(value_to_attribute).collect()),
        Value::Object(map) => AttributeValue::M(
            map.iter()
                .map(|(k, v)| (k.clone(), value_to_attribute(v)))
                .collect(),
        ),
    }
}

/// # Errors
///
/// Returns a `StoreError` for numbers that are not valid JSON numbers or for
/// attribute types rows never use (binary and set types).
pub fn attribute_to_value(attribute: &AttributeValue) -> Result<Value, MailError> {
    let value = match attribute {
        AttributeValue::Null(_) => Value::Null,
        AttributeValue::Bool(b) => Value::Bool(*b),
        AttributeValue::S(s) => Value::String(s.clone()),
        AttributeValue::N(n) => parse_number(n)?,
        AttributeValue::L(items) => Value::Array(
            items
                .iter()
                .map(attribute_to_value)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        AttributeValue::M(map) => Value::Object(
            map.iter()
                .map(|(k, v)| attribute_to_value(v).map(|v| (k.clone(), v)))
                .collect::<Result<Map<_, _>, _>>()?,
        ),
        AttributeValue::Ss(items) => {
            Value::Array(items.iter().cloned().map(Value::String).collect())
        }
        other => {
            return Err(MailError::StoreError(format!(
                "unsupported attribute type: {other:?}"
            )));
        }
    };
    Ok(value)
}

fn parse_number(raw: &str) -> Result<Value, MailError> {
    if let Ok(i) = raw.parse::<i64>() {
        return Ok(Value::Number(i.into()));
    }
    raw.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| MailError::StoreError(format!("invalid number attribute: {raw}")))
}

/// # Errors
///
/// Returns an error if the row does not serialize to a JSON object.
pub fn to_item<T: Serialize>(row: &T) -> Result<Item, MailError> {
    match serde_json::to_value(row)? {
        Value::Object(map) => Ok(map
            .iter()
            .map(|(k, v)| (k.clone(), value_to_attribute(v)))
            .collect()),
        other => Err(MailError::StoreError(format!(
            "row must serialize to an object, got {other}"
        ))),
    }
}

/// # Errors
///
/// Returns an error if the item does not deserialize into `T`.
pub fn from_item<T: DeserializeOwned>(item: &Item) -> Result<T, MailError> {
    let map = item
        .iter()
        .map(|(k, v)| attribute_to_value(v).map(|v| (k.clone(), v)))
        .collect::<Result<Map<_, _>, _>>()?;
    serde_json::from_value(Value::Object(map))
        .map_err(|e| MailError::StoreError(format!("failed to decode row: {e}")))
}

#[must_use]
pub fn s(value: impl Into<String>) -> AttributeValue {
    AttributeValue::S(value.into())
}
