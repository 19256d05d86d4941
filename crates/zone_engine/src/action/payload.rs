use serde_json::{Map, Value};
use thiserror::Error;

use crate::world::{AttributeValue, Attributes, ObjectId};

const TYPE_FIELD: &str = "type";

#[derive(Debug, Error)]
pub enum ActionParseError {
    #[error("action payload is not valid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("action payload must be a json object")]
    NotAnObject,
    #[error("action payload has no string `type` field")]
    MissingType,
    #[error("action type cannot be empty")]
    EmptyType,
    #[error("action field `{field}` must be a bool, number or string")]
    UnsupportedField { field: String },
}

/// A type-tagged bag of fields submitted by one player. Consumed by the
/// dispatcher during the turn it is drained.
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    kind: String,
    fields: Attributes,
}

impl Action {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            fields: Attributes::new(),
        }
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.fields.set(field, value);
        self
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn fields(&self) -> &Attributes {
        &self.fields
    }

    pub fn has(&self, field: &str) -> bool {
        self.fields.has(field)
    }

    pub fn int(&self, field: &str) -> Option<i64> {
        self.fields.int(field)
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        self.fields.text(field)
    }

    /// Reads an integer field as an object id. Negative or oversized values
    /// read as absent.
    pub fn object_id(&self, field: &str) -> Option<ObjectId> {
        let raw = self.fields.int(field)?;
        u32::try_from(raw).ok().map(ObjectId)
    }

    pub fn from_json_str(input: &str) -> Result<Self, ActionParseError> {
        let value: Value = serde_json::from_str(input)?;
        Self::from_json(value)
    }

    /// Accepts `{"type": "...", ...}`. Null fields are treated as absent;
    /// arrays and nested objects are rejected.
    pub fn from_json(value: Value) -> Result<Self, ActionParseError> {
        let Value::Object(map) = value else {
            return Err(ActionParseError::NotAnObject);
        };
        Self::from_json_map(map)
    }

    pub fn from_json_map(mut map: Map<String, Value>) -> Result<Self, ActionParseError> {
        let kind = match map.remove(TYPE_FIELD) {
            Some(Value::String(kind)) => kind,
            _ => return Err(ActionParseError::MissingType),
        };
        if kind.trim().is_empty() {
            return Err(ActionParseError::EmptyType);
        }

        let mut action = Action::new(kind);
        for (field, value) in map {
            let value = match value {
                Value::Null => continue,
                Value::Bool(flag) => AttributeValue::Flag(flag),
                Value::Number(number) => match number.as_i64() {
                    Some(int) => AttributeValue::Int(int),
                    None => match number.as_f64() {
                        Some(float) => AttributeValue::Float(float),
                        None => return Err(ActionParseError::UnsupportedField { field }),
                    },
                },
                Value::String(text) => AttributeValue::Text(text),
                Value::Array(_) | Value::Object(_) => {
                    return Err(ActionParseError::UnsupportedField { field })
                }
            };
            action.fields.set(field, value);
        }
        Ok(action)
    }
}
