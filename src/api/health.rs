use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: i64,
    /// `ok` or `unreachable`
    pub store: String,
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is up; `store` reports the document store", body = HealthResponse)
    )
)]
pub async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let store = match state.store.ping().await {
        Ok(()) => "ok",
        Err(e) => {
            log::warn!("⚠️  Store ping failed: {}", e);
            "unreachable"
        }
    };

    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        service: "sciweb-backend".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now().timestamp(),
        store: store.to_string(),
    })
}
