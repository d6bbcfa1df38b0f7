use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// One message of a chat-completion conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".into(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".into(), content: content.into() }
    }
}

/// History entry as sent by the concept-map page; either field may be missing.
#[derive(Debug, Clone, Default, Deserialize, utoipa::ToSchema)]
pub struct HistoryEntry {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, utoipa::ToSchema)]
pub struct ChallengeRequest {
    #[serde(default)]
    pub chat_history: Vec<HistoryEntry>,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub concept_map: Value,
    #[serde(default)]
    pub subject: String,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ChallengeResponse {
    pub message: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OnboardingRequest {
    #[serde(default)]
    pub responses: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnboardingCard {
    pub title: String,
    pub content: String,
    pub icon: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OnboardingCards {
    #[serde(default)]
    pub cards: Vec<OnboardingCard>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeTreeRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub responses: Vec<Value>,
    #[serde(default)]
    pub classes: Vec<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JupiterRequest {
    #[serde(default)]
    pub osis: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RealtimeTokenRequest {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub voice: Option<String>,
}

pub fn onboarding_cards_schema() -> Value {
    json!({
        "type": "object",
        "additionalProperties": false,
        "required": ["cards"],
        "properties": {
            "cards": {
                "type": "array",
                "items": {
                    "type": "object",
                    "additionalProperties": false,
                    "required": ["title", "content", "icon"],
                    "properties": {
                        "title": { "type": "string" },
                        "content": { "type": "string" },
                        "icon": { "type": "string" }
                    }
                }
            }
        }
    })
}
