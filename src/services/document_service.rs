use serde_json::Value;

use crate::database::{DocumentStore, Fields};
use crate::models::collection::{validate_document_id, validate_payload, CollectionName, WriteMode};
use crate::utils::{now_timestamp, AppError};

/// Outcome of a PUT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceOutcome {
    Created,
    Replaced,
}

/// Turns an optional request body into a non-empty field map.
pub fn require_fields(body: Option<Value>) -> Result<Fields, AppError> {
    match body {
        Some(Value::Object(fields)) if !fields.is_empty() => Ok(fields),
        Some(Value::Object(_)) | Some(Value::Null) | None => Err(AppError::bad_request("No data provided")),
        Some(_) => Err(AppError::bad_request("Request body must be a JSON object")),
    }
}

/// Every document of a collection as `{id: fields}` objects.
pub async fn list_documents(store: &dyn DocumentStore, collection: &CollectionName) -> Result<Vec<Value>, AppError> {
    let documents = store.list(collection.as_str()).await?;
    Ok(documents.into_iter().map(|d| d.into_keyed()).collect())
}

pub async fn get_document(
    store: &dyn DocumentStore,
    collection: &CollectionName,
    id: &str,
) -> Result<Fields, AppError> {
    validate_document_id(id)?;
    store
        .get(collection.as_str(), id)
        .await?
        .ok_or_else(|| AppError::not_found("Document not found"))
}

/// Creates a document under a store-generated ID, stamping `createdAt`/`updatedAt` when absent.
pub async fn create_document(
    store: &dyn DocumentStore,
    collection: &CollectionName,
    body: Option<Value>,
) -> Result<String, AppError> {
    let mut fields = require_fields(body)?;
    validate_payload(collection, &fields, WriteMode::Create)?;

    let now = now_timestamp();
    fields
        .entry("createdAt")
        .or_insert_with(|| Value::String(now.clone()));
    fields.entry("updatedAt").or_insert_with(|| Value::String(now));

    let id = store.allocate_id();
    store.insert(collection.as_str(), &id, fields).await?;

    log::info!("📝 Created {}/{}", collection.as_str(), id);
    Ok(id)
}

/// Upsert: replaces the document wholesale or creates it under the given ID.
pub async fn replace_document(
    store: &dyn DocumentStore,
    collection: &CollectionName,
    id: &str,
    body: Option<Value>,
) -> Result<ReplaceOutcome, AppError> {
    validate_document_id(id)?;
    let fields = require_fields(body)?;
    validate_payload(collection, &fields, WriteMode::Replace)?;

    let existed = store.replace(collection.as_str(), id, fields).await?;
    Ok(if existed {
        ReplaceOutcome::Replaced
    } else {
        ReplaceOutcome::Created
    })
}

/// Merges fields into an existing document.
pub async fn merge_document(
    store: &dyn DocumentStore,
    collection: &CollectionName,
    id: &str,
    body: Option<Value>,
) -> Result<(), AppError> {
    validate_document_id(id)?;
    let fields = require_fields(body)?;
    validate_payload(collection, &fields, WriteMode::Merge)?;

    if store.merge(collection.as_str(), id, fields).await? {
        Ok(())
    } else {
        Err(AppError::not_found("Document not found"))
    }
}

pub async fn delete_document(store: &dyn DocumentStore, collection: &CollectionName, id: &str) -> Result<(), AppError> {
    validate_document_id(id)?;
    if store.delete(collection.as_str(), id).await? {
        log::info!("🗑️  Deleted {}/{}", collection.as_str(), id);
        Ok(())
    } else {
        Err(AppError::not_found("Document not found"))
    }
}
