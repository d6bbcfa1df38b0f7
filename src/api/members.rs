use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::api::documents::{into_value, JsonBody};
use crate::services::member_service;
use crate::state::AppState;
use crate::utils::AppError;

/// GET /api/Members/{id} - profile without credentials
pub async fn get_profile(state: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse, AppError> {
    let user = member_service::get_profile(state.store.as_ref(), &path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "user": user })))
}

/// PATCH /api/Members/{id}
pub async fn update_profile(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: JsonBody,
) -> Result<HttpResponse, AppError> {
    member_service::update_profile(state.store.as_ref(), &path.into_inner(), into_value(body)).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "User profile updated successfully" })))
}

/// GET /api/Members/{id}/classes
pub async fn get_classes(state: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse, AppError> {
    let classes = member_service::list_classes(state.store.as_ref(), &path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "classes": classes })))
}

/// POST /api/Members/{id}/classes - add or update one class entry
pub async fn manage_class(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: JsonBody,
) -> Result<HttpResponse, AppError> {
    let user_id = path.into_inner();
    let (operation, class) = member_service::manage_class(state.store.as_ref(), &user_id, into_value(body)).await?;

    log::info!("🎓 Class {} for member {}", operation.past_tense(), user_id);
    Ok(HttpResponse::Ok().json(json!({
        "message": format!("Class {} successfully", operation.past_tense()),
        "class": class
    })))
}

/// DELETE /api/Members/{id}/classes
pub async fn remove_class(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: JsonBody,
) -> Result<HttpResponse, AppError> {
    member_service::remove_class(state.store.as_ref(), &path.into_inner(), into_value(body)).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Class removed successfully" })))
}
