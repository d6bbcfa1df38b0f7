use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "SciWeb Backend API",
        version = "1.0.0",
        description = "Document-store proxy, social graph and AI gateway for the SciWeb planning platform.\n\n**Features:**\n- Generic collection CRUD under `/api`\n- Member profile, class, friend and channel routes\n- Concept-map and onboarding generation under `/ai`\n- Health monitoring"
    ),
    paths(
        crate::api::health::health_check,
        crate::api::documents::list_documents,
        crate::api::documents::get_document,
        crate::api::documents::create_document,
        crate::api::documents::update_document,
        crate::api::documents::replace_document,
        crate::api::documents::delete_document,
        crate::api::ai::challenge,
    ),
    components(
        schemas(
            crate::api::health::HealthResponse,
            crate::models::ai::ChallengeRequest,
            crate::models::ai::ChallengeResponse,
            crate::models::ai::HistoryEntry,
            crate::models::ai::ChatMessage,
        )
    ),
    tags(
        (name = "Health", description = "Health check including document store reachability."),
        (name = "Documents", description = "Generic collection proxy. Every verb maps onto one document-store operation."),
        (name = "AI", description = "Prompt assembly and relay to the OpenAI-compatible API."),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_routes() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/{collection}/{id}"));
        assert!(doc.paths.paths.contains_key("/ai/challenge"));
    }
}
