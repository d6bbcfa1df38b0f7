use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::database::Fields;
use crate::utils::AppError;

/// Fields never returned by profile or friend reads.
pub const SENSITIVE_FIELDS: [&str; 3] = ["password", "verification_code", "verificationCode"];

pub fn strip_sensitive(fields: &mut Fields) {
    for field in SENSITIVE_FIELDS {
        fields.remove(field);
    }
}

/// A `Members` document. Profile fields other than the social ones ride along in `profile`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Member {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default)]
    pub friends: Vec<String>,

    #[serde(default)]
    pub classes: Vec<Fields>,

    #[serde(flatten)]
    pub profile: Fields,
}

impl Member {
    pub fn from_fields(fields: Fields) -> Result<Self, AppError> {
        serde_json::from_value(Value::Object(fields))
            .map_err(|e| AppError::Internal(format!("Malformed member document: {}", e)))
    }

    pub fn into_fields(self) -> Result<Fields, AppError> {
        match serde_json::to_value(self) {
            Ok(Value::Object(fields)) => Ok(fields),
            Ok(_) => Err(AppError::Internal("member did not serialize to an object".into())),
            Err(e) => Err(AppError::Internal(e.to_string())),
        }
    }

    pub fn is_friend(&self, id: &str) -> bool {
        self.friends.iter().any(|f| f == id)
    }

    /// Returns `false` when `id` was already listed.
    pub fn add_friend(&mut self, id: &str) -> bool {
        if self.is_friend(id) {
            return false;
        }
        self.friends.push(id.to_string());
        true
    }

    /// Returns `false` when `id` was not listed.
    pub fn remove_friend(&mut self, id: &str) -> bool {
        let before = self.friends.len();
        self.friends.retain(|f| f != id);
        self.friends.len() != before
    }

    fn class_position(&self, class_id: Option<&Value>) -> Option<usize> {
        self.classes.iter().position(|c| c.get("id") == class_id)
    }

    /// Replaces the class with the same `id`, or appends it.
    pub fn upsert_class(&mut self, class: Fields) {
        match self.class_position(class.get("id")) {
            Some(i) => self.classes[i] = class,
            None => self.classes.push(class),
        }
    }

    /// Replaces the class with the same `id`. Returns `false` when there is none.
    pub fn replace_class(&mut self, class: Fields) -> bool {
        match self.class_position(class.get("id")) {
            Some(i) => {
                self.classes[i] = class;
                true
            }
            None => false,
        }
    }

    /// Removes every class whose `id` equals `class_id`, keeping the others in order.
    pub fn remove_class(&mut self, class_id: &Value) -> usize {
        let before = self.classes.len();
        self.classes.retain(|c| c.get("id") != Some(class_id));
        before - self.classes.len()
    }
}
