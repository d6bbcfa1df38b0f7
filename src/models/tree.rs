use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::database::Fields;

/// Node of a concept map. Clients store layout fields (`x`, `y`, `dueDate`, ...) next to these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    pub id: String,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,

    #[serde(flatten)]
    pub extra: Fields,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEdge {
    pub from: String,
    pub to: String,
}

/// Nodes and edges produced by a structured completion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TreeGraph {
    #[serde(default)]
    pub nodes: Vec<TreeNode>,
    #[serde(default)]
    pub edges: Vec<TreeEdge>,
}

/// Stored `Trees/{userId}` document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeDocument {
    pub user_id: String,
    pub nodes: Vec<TreeNode>,
    pub edges: Vec<TreeEdge>,
    pub created_at: String,
    pub updated_at: String,
}

/// JSON schema handed to the model when it must answer with a graph.
pub fn tree_graph_schema() -> Value {
    json!({
        "type": "object",
        "additionalProperties": false,
        "required": ["nodes", "edges"],
        "properties": {
            "nodes": {
                "type": "array",
                "items": {
                    "type": "object",
                    "additionalProperties": false,
                    "required": ["id", "type", "title", "content"],
                    "properties": {
                        "id": { "type": "string" },
                        "type": { "type": "string", "enum": ["goal", "subject", "interest", "skill", "task", "note"] },
                        "title": { "type": "string" },
                        "content": { "type": "string" }
                    }
                }
            },
            "edges": {
                "type": "array",
                "items": {
                    "type": "object",
                    "additionalProperties": false,
                    "required": ["from", "to"],
                    "properties": {
                        "from": { "type": "string" },
                        "to": { "type": "string" }
                    }
                }
            }
        }
    })
}
