use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::database::Fields;
use crate::utils::AppError;

/// A `Classes` document with its embedded channel and unit arrays.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassRecord {
    #[serde(default)]
    pub channels: Vec<Value>,

    #[serde(default)]
    pub units: Vec<Value>,

    #[serde(flatten)]
    pub rest: Fields,
}

impl ClassRecord {
    pub fn from_fields(fields: Fields) -> Result<Self, AppError> {
        serde_json::from_value(Value::Object(fields))
            .map_err(|e| AppError::Internal(format!("Malformed class document: {}", e)))
    }

    pub fn into_fields(self) -> Result<Fields, AppError> {
        match serde_json::to_value(self) {
            Ok(Value::Object(fields)) => Ok(fields),
            Ok(_) => Err(AppError::Internal("class did not serialize to an object".into())),
            Err(e) => Err(AppError::Internal(e.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    #[serde(default)]
    pub id: String,

    pub name: String,

    #[serde(flatten)]
    pub extra: Fields,
}

impl Channel {
    pub fn from_payload(payload: Fields) -> Result<Self, AppError> {
        let has_name = payload
            .get("name")
            .and_then(Value::as_str)
            .is_some_and(|name| !name.is_empty());
        if !has_name {
            return Err(AppError::bad_request("Channel name is required"));
        }

        serde_json::from_value(Value::Object(payload))
            .map_err(|e| AppError::bad_request(format!("Invalid channel: {}", e)))
    }
}

fn default_description() -> Value {
    Value::String(String::new())
}

fn default_position() -> Value {
    Value::from(0)
}

fn default_status() -> Value {
    Value::String("draft".to_string())
}

fn empty_list() -> Value {
    Value::Array(Vec::new())
}

/// A unit inside `Classes/{id}.units`.
///
/// Only `title` is checked. Other known fields get defaults when absent and keep
/// whatever JSON the caller sent otherwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Unit {
    #[serde(default)]
    pub id: String,

    pub title: String,

    #[serde(default = "default_description")]
    pub description: Value,

    #[serde(default = "default_position")]
    pub position: Value,

    #[serde(default = "default_status")]
    pub status: Value,

    #[serde(default = "empty_list")]
    pub associated_files: Value,

    #[serde(default = "empty_list")]
    pub associated_problems: Value,

    #[serde(default)]
    pub created_at: String,

    #[serde(default)]
    pub updated_at: String,

    #[serde(flatten)]
    pub extra: Fields,
}

impl Unit {
    pub fn from_payload(payload: Fields) -> Result<Self, AppError> {
        let has_title = payload
            .get("title")
            .and_then(Value::as_str)
            .is_some_and(|title| !title.is_empty());
        if !has_title {
            return Err(AppError::bad_request("Unit title is required"));
        }

        serde_json::from_value(Value::Object(payload))
            .map_err(|e| AppError::bad_request(format!("Invalid unit: {}", e)))
    }
}
