pub mod ai;
pub mod classes;
pub mod documents;
pub mod feeds;
pub mod friends;
pub mod health;
pub mod members;
pub mod pages;
pub mod swagger;

use actix_web::error::{JsonPayloadError, QueryPayloadError};
use actix_web::{web, HttpRequest};

use crate::utils::AppError;

/// JSON bodies above this size are rejected.
const JSON_LIMIT: usize = 2 * 1024 * 1024;

fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::bad_request(format!("Invalid JSON body: {}", err)).into()
}

fn query_error(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::bad_request(format!("Invalid query string: {}", err)).into()
}

/// Registers every route. Domain routes come before the generic collection proxy;
/// `route()` lifts each method guard onto its resource, so other verbs on the same
/// path fall through to the proxy.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().limit(JSON_LIMIT).error_handler(json_error))
        .app_data(web::QueryConfig::default().error_handler(query_error))
        .route("/health", web::get().to(health::health_check))
        // Pages
        .route("/", web::get().to(pages::index))
        .route("/tree", web::get().to(pages::tree))
        .route("/counselor", web::get().to(pages::counselor))
        .route("/class/{class_id}", web::get().to(pages::class_page))
        // AI gateway
        .service(
            web::scope("/ai")
                .route("/challenge", web::post().to(ai::challenge))
                .route("/voice_to_nodes", web::post().to(ai::voice_to_nodes))
                .route("/analyze_onboarding", web::post().to(ai::analyze_onboarding))
                .route("/fetch_jupiter_data", web::post().to(ai::fetch_jupiter_data))
                .route("/initialize_tree", web::post().to(ai::initialize_tree))
                .route("/get_realtime_token", web::post().to(ai::get_realtime_token))
                .route("/get_openai_key", web::get().to(ai::get_openai_key)),
        )
        .service(
            web::scope("/api")
                // Members
                .route("/Members/{id}", web::get().to(members::get_profile))
                .route("/Members/{id}", web::patch().to(members::update_profile))
                .route("/Members/{id}/classes", web::get().to(members::get_classes))
                .route("/Members/{id}/classes", web::post().to(members::manage_class))
                .route("/Members/{id}/classes", web::delete().to(members::remove_class))
                // Friends
                .route("/Members/{id}/friends", web::get().to(friends::list_friends))
                .route("/Members/{id}/friends", web::post().to(friends::add_friend))
                .route("/Members/{id}/friends", web::delete().to(friends::remove_friend))
                // Classes
                .route("/Classes/{id}/channels", web::post().to(classes::add_channel))
                .route(
                    "/Classes/{class_id}/channels/{channel_id}/messages",
                    web::get().to(classes::channel_messages),
                )
                .route("/Classes/{id}/units", web::post().to(classes::add_unit))
                // Feeds
                .route("/Assignments", web::get().to(feeds::list_assignments))
                .route("/Events", web::get().to(feeds::list_events))
                // Generic collection proxy (MUST stay last)
                .route("/{collection}", web::get().to(documents::list_documents))
                .route("/{collection}", web::post().to(documents::create_document))
                .route("/{collection}/{id}", web::get().to(documents::get_document))
                .route("/{collection}/{id}", web::patch().to(documents::update_document))
                .route("/{collection}/{id}", web::put().to(documents::replace_document))
                .route("/{collection}/{id}", web::delete().to(documents::delete_document)),
        );
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use actix_web::body::MessageBody;
    use actix_web::dev::{Service, ServiceResponse};
    use actix_web::http::StatusCode;
    use actix_web::{test, web, App};
    use serde_json::Value;

    use crate::config::Config;
    use crate::database::MemoryStore;
    use crate::middleware::ApiHeaders;
    use crate::state::AppState;

    pub async fn test_app_with(
        config: Config,
    ) -> impl Service<actix_http::Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error> {
        let state = AppState::new(Arc::new(MemoryStore::new()), config).unwrap();
        test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .wrap(ApiHeaders)
                .configure(super::configure),
        )
        .await
    }

    pub async fn test_app(
    ) -> impl Service<actix_http::Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error> {
        test_app_with(Config::default()).await
    }

    /// Sends a request with an optional JSON body and returns the status and JSON response (Null when empty).
    pub async fn call_json<S, B>(app: &S, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value)
    where
        S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
        B: MessageBody,
    {
        let method = actix_web::http::Method::from_bytes(method.as_bytes()).unwrap();
        let mut req = test::TestRequest::default().method(method).uri(uri);
        if let Some(body) = body {
            req = req.set_json(body);
        }

        let resp = test::call_service(app, req.to_request()).await;
        let status = resp.status();
        let bytes = test::read_body(resp).await;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }
}
