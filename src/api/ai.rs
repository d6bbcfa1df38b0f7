//! AI gateway: assembles prompts from the request and relays the model's answer.

use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use futures::StreamExt;
use serde_json::{json, Value};

use crate::database::Fields;
use crate::models::ai::{
    onboarding_cards_schema, ChallengeRequest, ChallengeResponse, InitializeTreeRequest, JupiterRequest,
    OnboardingCards, OnboardingRequest, RealtimeTokenRequest,
};
use crate::models::collection::{validate_document_id, TREES};
use crate::models::tree::{tree_graph_schema, TreeDocument, TreeGraph};
use crate::services::openai_service::AudioUpload;
use crate::services::prompts;
use crate::state::AppState;
use crate::utils::{now_timestamp, AppError};

/// Upper bound on an uploaded recording, matching the transcription API's own limit.
const MAX_AUDIO_BYTES: usize = 25 * 1024 * 1024;
const MAX_TREE_STATE_BYTES: usize = 1024 * 1024;

/// POST /ai/challenge - next Socratic prompt for the concept-map chat
#[utoipa::path(
    post,
    path = "/ai/challenge",
    tag = "AI",
    request_body = ChallengeRequest,
    responses(
        (status = 200, description = "Generated message", body = ChallengeResponse),
        (status = 503, description = "No API key configured"),
        (status = 502, description = "Upstream error")
    )
)]
pub async fn challenge(
    state: web::Data<AppState>,
    body: web::Json<ChallengeRequest>,
) -> Result<HttpResponse, AppError> {
    let messages = prompts::challenge_messages(&body);
    let message = state.openai.chat(&messages).await?;
    Ok(HttpResponse::Ok().json(ChallengeResponse { message }))
}

struct VoiceUpload {
    audio: Option<AudioUpload>,
    tree_state: Option<String>,
}

async fn read_field(field: &mut actix_multipart::Field, limit: usize) -> Result<Vec<u8>, AppError> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(|e| AppError::bad_request(format!("Invalid upload: {}", e)))?;
        if bytes.len() + chunk.len() > limit {
            return Err(AppError::bad_request("Upload too large"));
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

async fn read_voice_upload(mut payload: Multipart) -> Result<VoiceUpload, AppError> {
    let mut upload = VoiceUpload { audio: None, tree_state: None };

    while let Some(field) = payload.next().await {
        let mut field = field.map_err(|e| AppError::bad_request(format!("Invalid multipart body: {}", e)))?;
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "audio" => {
                let file_name = field
                    .content_disposition()
                    .and_then(|cd| cd.get_filename())
                    .unwrap_or("audio.webm")
                    .to_string();
                let content_type = field
                    .content_type()
                    .map(|mime| mime.to_string())
                    .unwrap_or_else(|| "application/octet-stream".to_string());
                let bytes = read_field(&mut field, MAX_AUDIO_BYTES).await?;
                upload.audio = Some(AudioUpload { bytes, file_name, content_type });
            }
            "tree_state" => {
                let bytes = read_field(&mut field, MAX_TREE_STATE_BYTES).await?;
                let text = String::from_utf8(bytes).map_err(|_| AppError::bad_request("tree_state must be UTF-8"))?;
                upload.tree_state = Some(text);
            }
            _ => {
                // Drain unknown fields so the stream can advance.
                read_field(&mut field, MAX_AUDIO_BYTES).await?;
            }
        }
    }

    Ok(upload)
}

/// POST /ai/voice_to_nodes - multipart `audio` + `tree_state`
pub async fn voice_to_nodes(state: web::Data<AppState>, payload: Multipart) -> Result<HttpResponse, AppError> {
    let upload = read_voice_upload(payload).await?;
    let audio = upload
        .audio
        .filter(|a| !a.bytes.is_empty())
        .ok_or_else(|| AppError::bad_request("No audio file provided"))?;
    let tree_state: Value = match upload.tree_state.as_deref().map(str::trim) {
        None | Some("") => json!({ "nodes": [], "edges": [] }),
        Some(raw) => serde_json::from_str(raw).map_err(|e| AppError::bad_request(format!("Invalid tree_state: {}", e)))?,
    };

    let transcript = state.openai.transcribe(audio).await?;
    let messages = prompts::voice_to_nodes_messages(&transcript, &tree_state);
    let graph: TreeGraph = state.openai.structured(&messages, "tree_graph", tree_graph_schema()).await?;

    log::info!("🌳 Voice note produced {} nodes, {} edges", graph.nodes.len(), graph.edges.len());
    Ok(HttpResponse::Ok().json(json!({
        "transcript": transcript,
        "nodes": graph.nodes,
        "edges": graph.edges
    })))
}

/// POST /ai/analyze_onboarding
pub async fn analyze_onboarding(
    state: web::Data<AppState>,
    body: web::Json<OnboardingRequest>,
) -> Result<HttpResponse, AppError> {
    if body.responses.is_empty() {
        return Err(AppError::bad_request("No responses provided"));
    }

    let messages = prompts::onboarding_messages(&body.responses);
    let cards: OnboardingCards = state
        .openai
        .structured(&messages, "onboarding_cards", onboarding_cards_schema())
        .await?;
    Ok(HttpResponse::Ok().json(cards))
}

/// POST /ai/fetch_jupiter_data
pub async fn fetch_jupiter_data(
    state: web::Data<AppState>,
    body: web::Json<JupiterRequest>,
) -> Result<HttpResponse, AppError> {
    let request = body.into_inner();
    let classes = state
        .jupiter
        .fetch_classes(
            request.osis.as_deref().unwrap_or_default(),
            request.password.as_deref().unwrap_or_default(),
        )
        .await?;
    Ok(HttpResponse::Ok().json(classes))
}

/// POST /ai/initialize_tree - generates the first knowledge map and stores it under `Trees/{userId}`
pub async fn initialize_tree(
    state: web::Data<AppState>,
    body: web::Json<InitializeTreeRequest>,
) -> Result<HttpResponse, AppError> {
    let request = body.into_inner();
    let user_id = request
        .user_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::bad_request("User ID is required"))?;
    validate_document_id(&user_id)?;

    let messages = prompts::initialize_tree_messages(&request.responses, &request.classes);
    let graph: TreeGraph = state.openai.structured(&messages, "tree_graph", tree_graph_schema()).await?;

    let now = now_timestamp();
    let tree = TreeDocument {
        user_id: user_id.clone(),
        nodes: graph.nodes,
        edges: graph.edges,
        created_at: now.clone(),
        updated_at: now,
    };
    let fields: Fields = match serde_json::to_value(&tree) {
        Ok(Value::Object(fields)) => fields,
        Ok(_) => return Err(AppError::Internal("Tree did not serialize to an object".to_string())),
        Err(e) => return Err(AppError::Internal(e.to_string())),
    };
    state.store.replace(TREES, &user_id, fields).await?;

    log::info!("🌳 Initialized tree for {} with {} nodes", user_id, tree.nodes.len());
    Ok(HttpResponse::Created().json(json!({
        "id": user_id,
        "nodes": tree.nodes,
        "edges": tree.edges
    })))
}

/// POST /ai/get_realtime_token
pub async fn get_realtime_token(
    state: web::Data<AppState>,
    body: Option<web::Json<RealtimeTokenRequest>>,
) -> Result<HttpResponse, AppError> {
    let request = body.map(|b| b.into_inner()).unwrap_or_default();
    let session = state
        .openai
        .create_realtime_session(request.model.as_deref(), request.voice.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(session))
}

/// GET /ai/get_openai_key
pub async fn get_openai_key(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let key = state.openai.api_key()?;
    Ok(HttpResponse::Ok().json(json!({ "key": key })))
}
