//! Generic collection proxy: each HTTP verb maps onto one document-store operation.

use actix_web::{web, HttpResponse};
use serde_json::{json, Map, Value};

use crate::models::collection::CollectionName;
use crate::services::document_service::{self, ReplaceOutcome};
use crate::state::AppState;
use crate::utils::AppError;

/// Body as optional JSON; a missing or unparsable body reaches the service as `None`.
pub type JsonBody = Option<web::Json<Value>>;

pub fn into_value(body: JsonBody) -> Option<Value> {
    body.map(|b| b.into_inner())
}

/// GET /api/{collection}
#[utoipa::path(
    get,
    path = "/api/{collection}",
    tag = "Documents",
    params(("collection" = String, Path, description = "Collection name")),
    responses(
        (status = 200, description = "Array of {id: fields} objects"),
        (status = 400, description = "Invalid collection name")
    )
)]
pub async fn list_documents(state: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse, AppError> {
    let collection = CollectionName::parse(&path.into_inner())?;
    let documents = document_service::list_documents(state.store.as_ref(), &collection).await?;
    Ok(HttpResponse::Ok().json(documents))
}

/// GET /api/{collection}/{id}
#[utoipa::path(
    get,
    path = "/api/{collection}/{id}",
    tag = "Documents",
    params(
        ("collection" = String, Path, description = "Collection name"),
        ("id" = String, Path, description = "Document ID")
    ),
    responses(
        (status = 200, description = "{id: fields}"),
        (status = 404, description = "Document not found")
    )
)]
pub async fn get_document(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, AppError> {
    let (collection, id) = path.into_inner();
    let collection = CollectionName::parse(&collection)?;
    let fields = document_service::get_document(state.store.as_ref(), &collection, &id).await?;

    let mut keyed = Map::with_capacity(1);
    keyed.insert(id, Value::Object(fields));
    Ok(HttpResponse::Ok().json(Value::Object(keyed)))
}

/// POST /api/{collection}
#[utoipa::path(
    post,
    path = "/api/{collection}",
    tag = "Documents",
    params(("collection" = String, Path, description = "Collection name")),
    responses(
        (status = 201, description = "Document created"),
        (status = 400, description = "No data provided or invalid payload")
    )
)]
pub async fn create_document(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: JsonBody,
) -> Result<HttpResponse, AppError> {
    let collection = CollectionName::parse(&path.into_inner())?;
    let id = document_service::create_document(state.store.as_ref(), &collection, into_value(body)).await?;

    Ok(HttpResponse::Created().json(json!({
        "id": id,
        "message": "Document created successfully"
    })))
}

/// PATCH /api/{collection}/{id}
#[utoipa::path(
    patch,
    path = "/api/{collection}/{id}",
    tag = "Documents",
    params(
        ("collection" = String, Path, description = "Collection name"),
        ("id" = String, Path, description = "Document ID")
    ),
    responses(
        (status = 200, description = "Document updated"),
        (status = 404, description = "Document not found")
    )
)]
pub async fn update_document(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    body: JsonBody,
) -> Result<HttpResponse, AppError> {
    let (collection, id) = path.into_inner();
    let collection = CollectionName::parse(&collection)?;
    document_service::merge_document(state.store.as_ref(), &collection, &id, into_value(body)).await?;

    Ok(HttpResponse::Ok().json(json!({ "message": "Document updated successfully" })))
}

/// PUT /api/{collection}/{id}
#[utoipa::path(
    put,
    path = "/api/{collection}/{id}",
    tag = "Documents",
    params(
        ("collection" = String, Path, description = "Collection name"),
        ("id" = String, Path, description = "Document ID")
    ),
    responses(
        (status = 200, description = "Document replaced"),
        (status = 201, description = "Document created")
    )
)]
pub async fn replace_document(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    body: JsonBody,
) -> Result<HttpResponse, AppError> {
    let (collection, id) = path.into_inner();
    let collection = CollectionName::parse(&collection)?;

    match document_service::replace_document(state.store.as_ref(), &collection, &id, into_value(body)).await? {
        ReplaceOutcome::Replaced => Ok(HttpResponse::Ok().json(json!({ "message": "Document replaced successfully" }))),
        ReplaceOutcome::Created => Ok(HttpResponse::Created().json(json!({
            "message": "Document created successfully",
            "id": id
        }))),
    }
}

/// DELETE /api/{collection}/{id}
#[utoipa::path(
    delete,
    path = "/api/{collection}/{id}",
    tag = "Documents",
    params(
        ("collection" = String, Path, description = "Collection name"),
        ("id" = String, Path, description = "Document ID")
    ),
    responses(
        (status = 200, description = "Document deleted"),
        (status = 404, description = "Document not found")
    )
)]
pub async fn delete_document(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, AppError> {
    let (collection, id) = path.into_inner();
    let collection = CollectionName::parse(&collection)?;
    document_service::delete_document(state.store.as_ref(), &collection, &id).await?;

    Ok(HttpResponse::Ok().json(json!({ "message": "Document deleted successfully" })))
}
