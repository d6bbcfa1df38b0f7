use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::api::documents::{into_value, JsonBody};
use crate::services::class_service;
use crate::state::AppState;
use crate::utils::AppError;

/// POST /api/Classes/{id}/channels
pub async fn add_channel(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: JsonBody,
) -> Result<HttpResponse, AppError> {
    let channel = class_service::add_channel(state.store.as_ref(), &path.into_inner(), into_value(body)).await?;
    Ok(HttpResponse::Created().json(json!({
        "message": "Channel added successfully",
        "channel": channel
    })))
}

/// GET /api/Classes/{classId}/channels/{channelId}/messages
pub async fn channel_messages(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, AppError> {
    let (class_id, channel_id) = path.into_inner();
    let messages = class_service::channel_messages(state.store.as_ref(), &class_id, &channel_id).await?;
    Ok(HttpResponse::Ok().json(messages))
}

/// POST /api/Classes/{id}/units
pub async fn add_unit(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: JsonBody,
) -> Result<HttpResponse, AppError> {
    let unit = class_service::add_unit(state.store.as_ref(), &path.into_inner(), into_value(body)).await?;
    Ok(HttpResponse::Created().json(json!({
        "message": "Unit added successfully",
        "unit": unit
    })))
}
