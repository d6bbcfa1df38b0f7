use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::api::documents::{into_value, JsonBody};
use crate::services::friend_service;
use crate::state::AppState;
use crate::utils::AppError;

/// GET /api/Members/{id}/friends
pub async fn list_friends(state: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse, AppError> {
    let friends = friend_service::list_friends(state.store.as_ref(), &path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "friends": friends })))
}

/// POST /api/Members/{id}/friends - body `{friendUsername}`
pub async fn add_friend(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: JsonBody,
) -> Result<HttpResponse, AppError> {
    let friend_id = friend_service::add_friend(state.store.as_ref(), &path.into_inner(), into_value(body)).await?;
    Ok(HttpResponse::Ok().json(json!({
        "message": "Friend added successfully",
        "friendId": friend_id
    })))
}

/// DELETE /api/Members/{id}/friends - body `{friendId}`
pub async fn remove_friend(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: JsonBody,
) -> Result<HttpResponse, AppError> {
    friend_service::remove_friend(state.store.as_ref(), &path.into_inner(), into_value(body)).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Friend removed successfully" })))
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::{call_json, test_app};
    use actix_web::http::StatusCode;
    use serde_json::json;

    #[actix_web::test]
    async fn test_friendship_round_trip() {
        let app = test_app().await;
        call_json(&app, "PUT", "/api/Members/a", Some(json!({"username": "ana"}))).await;
        call_json(&app, "PUT", "/api/Members/b", Some(json!({"username": "ben", "password": "x"}))).await;

        let (status, body) = call_json(&app, "POST", "/api/Members/a/friends", Some(json!({"friendUsername": "ben"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["friendId"], "b");

        let (status, body) = call_json(&app, "POST", "/api/Members/a/friends", Some(json!({"friendUsername": "ben"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Already friends with this user");

        let (_, body) = call_json(&app, "GET", "/api/Members/b/friends", None).await;
        assert_eq!(body["friends"][0]["id"], "a");

        let (_, body) = call_json(&app, "GET", "/api/Members/a/friends", None).await;
        assert_eq!(body["friends"][0]["username"], "ben");
        assert!(body["friends"][0].get("password").is_none());

        let (status, _) = call_json(&app, "DELETE", "/api/Members/a/friends", Some(json!({"friendId": "b"}))).await;
        assert_eq!(status, StatusCode::OK);
        let (_, body) = call_json(&app, "GET", "/api/Members/b/friends", None).await;
        assert_eq!(body["friends"], json!([]));
    }
}
