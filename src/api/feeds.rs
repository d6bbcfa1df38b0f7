use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::models::collection::{ASSIGNMENTS, EVENTS};
use crate::services::class_service;
use crate::state::AppState;
use crate::utils::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedQuery {
    pub class_id: Option<String>,
}

/// GET /api/Assignments?classId=
pub async fn list_assignments(
    state: web::Data<AppState>,
    query: web::Query<FeedQuery>,
) -> Result<HttpResponse, AppError> {
    let items = class_service::list_feed(state.store.as_ref(), ASSIGNMENTS, query.class_id.as_deref()).await?;
    Ok(HttpResponse::Ok().json(items))
}

/// GET /api/Events?classId=
pub async fn list_events(state: web::Data<AppState>, query: web::Query<FeedQuery>) -> Result<HttpResponse, AppError> {
    let items = class_service::list_feed(state.store.as_ref(), EVENTS, query.class_id.as_deref()).await?;
    Ok(HttpResponse::Ok().json(items))
}
