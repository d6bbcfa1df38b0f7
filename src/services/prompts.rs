//! Message lists sent to the chat-completion API by the `/ai` routes.

use serde_json::Value;

use crate::models::ai::{ChallengeRequest, ChatMessage, HistoryEntry};

/// How many trailing history entries the challenge prompt looks at.
pub const CHALLENGE_HISTORY_WINDOW: usize = 5;

const CHALLENGE_SYSTEM: &str = "Your goal is to get the user to connect with their existing understanding of the \
subject by adding nodes to the concept map. Try not to give too much direct information, in order to make it \
feel more like a conversation.";

const VOICE_TO_NODES_SYSTEM: &str = "You turn a student's spoken thoughts into additions to their concept map. \
Return only new nodes and the edges that connect them to each other or to existing nodes. Reuse existing node \
IDs when linking and give new nodes short unique IDs.";

const ONBOARDING_SYSTEM: &str = "You are an academic counselor. From the student's onboarding answers, write \
three to five short recommendation cards. Each card has a title, one or two sentences of content and a single \
emoji icon.";

const INITIALIZE_TREE_SYSTEM: &str = "You build the first version of a student's knowledge map. Create one goal \
node per stated goal, one subject node per class, and interest or skill nodes from their answers. Connect goals \
to the subjects and skills that support them.";

fn to_json_text(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| value.to_string())
}

/// Keeps user/assistant entries with content, drawn from the last `CHALLENGE_HISTORY_WINDOW` entries.
fn recent_history(history: &[HistoryEntry]) -> impl Iterator<Item = ChatMessage> + '_ {
    let start = history.len().saturating_sub(CHALLENGE_HISTORY_WINDOW);
    history[start..].iter().filter_map(|entry| {
        let role = entry.role.as_deref()?;
        let content = entry.content.as_deref().filter(|c| !c.is_empty())?;
        matches!(role, "user" | "assistant").then(|| ChatMessage {
            role: role.to_string(),
            content: content.to_string(),
        })
    })
}

pub fn challenge_messages(request: &ChallengeRequest) -> Vec<ChatMessage> {
    let mut messages = vec![
        ChatMessage::system(CHALLENGE_SYSTEM),
        ChatMessage::user(format!(
            "The current concept map/tree structure for the subject '{}' is: {}",
            request.subject,
            to_json_text(&request.concept_map)
        )),
    ];
    messages.extend(recent_history(&request.chat_history));
    messages
}

pub fn voice_to_nodes_messages(transcript: &str, tree_state: &Value) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(VOICE_TO_NODES_SYSTEM),
        ChatMessage::user(format!(
            "Current concept map: {}\n\nWhat the student said: {}",
            to_json_text(tree_state),
            transcript
        )),
    ]
}

pub fn onboarding_messages(responses: &[Value]) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(ONBOARDING_SYSTEM),
        ChatMessage::user(format!(
            "Onboarding answers: {}",
            to_json_text(&Value::Array(responses.to_vec()))
        )),
    ]
}

pub fn initialize_tree_messages(responses: &[Value], classes: &[Value]) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(INITIALIZE_TREE_SYSTEM),
        ChatMessage::user(format!(
            "Onboarding answers: {}\n\nCurrent classes: {}",
            to_json_text(&Value::Array(responses.to_vec())),
            to_json_text(&Value::Array(classes.to_vec()))
        )),
    ]
}
