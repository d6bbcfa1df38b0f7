use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::database::Fields;
use crate::models::tree::{TreeEdge, TreeNode};
use crate::utils::AppError;

pub const MEMBERS: &str = "Members";
pub const CLASSES: &str = "Classes";
pub const MESSAGES: &str = "Messages";
pub const ASSIGNMENTS: &str = "Assignments";
pub const EVENTS: &str = "Events";
pub const TREES: &str = "Trees";

const MAX_COLLECTION_NAME: usize = 120;
const MAX_DOCUMENT_ID: usize = 1500;
const RESERVED_ID_FIELD: &str = "_id";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    Members,
    Classes,
    Messages,
    Assignments,
    Events,
    Trees,
    Other,
}

/// How a payload is about to be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Create,
    Merge,
    Replace,
}

/// A validated collection name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionName(String);

impl CollectionName {
    pub fn parse(name: &str) -> Result<Self, AppError> {
        let valid = !name.is_empty()
            && name.len() <= MAX_COLLECTION_NAME
            && !name.starts_with("system")
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

        if valid {
            Ok(Self(name.to_string()))
        } else {
            Err(AppError::bad_request(format!("Invalid collection name: {}", name)))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn kind(&self) -> CollectionKind {
        match self.0.as_str() {
            MEMBERS => CollectionKind::Members,
            CLASSES => CollectionKind::Classes,
            MESSAGES => CollectionKind::Messages,
            ASSIGNMENTS => CollectionKind::Assignments,
            EVENTS => CollectionKind::Events,
            TREES => CollectionKind::Trees,
            _ => CollectionKind::Other,
        }
    }
}

pub fn validate_document_id(id: &str) -> Result<(), AppError> {
    if id.is_empty() || id.len() > MAX_DOCUMENT_ID || id.contains('/') {
        return Err(AppError::bad_request(format!("Invalid document id: {}", id)));
    }
    Ok(())
}

#[derive(Deserialize)]
#[allow(dead_code)]
struct MemberSchema {
    username: Option<String>,
    #[serde(default)]
    friends: Vec<String>,
    #[serde(default)]
    classes: Vec<Fields>,
}

#[derive(Deserialize)]
#[allow(dead_code)]
struct ClassSchema {
    #[serde(default)]
    channels: Vec<Fields>,
    #[serde(default)]
    units: Vec<Fields>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeedSchema {
    class_id: Option<String>,
    channel_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(dead_code)]
struct TreeSchema {
    user_id: Option<String>,
    #[serde(default)]
    nodes: Vec<TreeNode>,
    #[serde(default)]
    edges: Vec<TreeEdge>,
}

fn check<T: DeserializeOwned>(collection: &str, fields: &Fields) -> Result<T, AppError> {
    serde_json::from_value(Value::Object(fields.clone()))
        .map_err(|e| AppError::bad_request(format!("Invalid {} document: {}", collection, e)))
}

/// Checks a payload against the schema of its collection before it reaches the store.
///
/// Unknown collections accept any object. `_id` is owned by the store and never accepted.
/// List fields may be absent but not `null`.
pub fn validate_payload(collection: &CollectionName, fields: &Fields, mode: WriteMode) -> Result<(), AppError> {
    if fields.contains_key(RESERVED_ID_FIELD) {
        return Err(AppError::bad_request("_id is reserved and cannot be written"));
    }

    let name = collection.as_str();
    let whole_document = mode != WriteMode::Merge;

    match collection.kind() {
        CollectionKind::Members => {
            check::<MemberSchema>(name, fields)?;
        }
        CollectionKind::Classes => {
            check::<ClassSchema>(name, fields)?;
        }
        CollectionKind::Trees => {
            check::<TreeSchema>(name, fields)?;
        }
        kind @ (CollectionKind::Messages | CollectionKind::Assignments | CollectionKind::Events) => {
            let feed = check::<FeedSchema>(name, fields)?;
            if whole_document && feed.class_id.is_none() {
                return Err(AppError::bad_request(format!("{} documents require a classId", name)));
            }
            if whole_document && kind == CollectionKind::Messages && feed.channel_id.is_none() {
                return Err(AppError::bad_request("Messages documents require a channelId"));
            }
        }
        CollectionKind::Other => {}
    }

    Ok(())
}
