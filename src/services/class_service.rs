use serde_json::Value;

use crate::database::{DocRef, DocumentStore, Fields};
use crate::models::class::{Channel, ClassRecord, Unit};
use crate::models::collection::{validate_document_id, CLASSES, MESSAGES};
use crate::services::document_service::require_fields;
use crate::utils::{now_timestamp, AppError};

/// Appends `entry` to one of the class's embedded arrays inside a transaction.
async fn append_to_class<F>(store: &dyn DocumentStore, class_id: &str, entry: Value, select: F) -> Result<(), AppError>
where
    F: Fn(&mut ClassRecord) -> &mut Vec<Value> + Send + Sync,
{
    validate_document_id(class_id)?;
    let targets = [DocRef::new(CLASSES, class_id)];

    store
        .transact(&targets, &mut |slots: &mut [Option<Fields>]| -> Result<(), AppError> {
            let fields = slots[0].take().ok_or_else(|| AppError::not_found("Class not found"))?;
            let mut class = ClassRecord::from_fields(fields)?;
            select(&mut class).push(entry.clone());
            class
                .rest
                .insert("updatedAt".to_string(), Value::String(now_timestamp()));
            slots[0] = Some(class.into_fields()?);
            Ok(())
        })
        .await
}

fn to_value<T: serde::Serialize>(item: &T) -> Result<Value, AppError> {
    serde_json::to_value(item).map_err(|e| AppError::Internal(e.to_string()))
}

/// Adds a channel to `Classes/{class_id}.channels` under a freshly allocated ID.
pub async fn add_channel(store: &dyn DocumentStore, class_id: &str, body: Option<Value>) -> Result<Channel, AppError> {
    let payload = require_fields(body).map_err(|_| AppError::bad_request("No channel data provided"))?;
    let mut channel = Channel::from_payload(payload)?;
    channel.id = store.allocate_id();

    append_to_class(store, class_id, to_value(&channel)?, |class| &mut class.channels).await?;

    log::info!("📣 Channel {} added to class {}", channel.id, class_id);
    Ok(channel)
}

/// Adds a unit to `Classes/{class_id}.units`, filling in the unit defaults.
pub async fn add_unit(store: &dyn DocumentStore, class_id: &str, body: Option<Value>) -> Result<Unit, AppError> {
    let payload = require_fields(body).map_err(|_| AppError::bad_request("No unit data provided"))?;
    let mut unit = Unit::from_payload(payload)?;
    let now = now_timestamp();
    unit.id = store.allocate_id();
    unit.created_at = now.clone();
    unit.updated_at = now;

    append_to_class(store, class_id, to_value(&unit)?, |class| &mut class.units).await?;

    log::info!("📚 Unit {} added to class {}", unit.id, class_id);
    Ok(unit)
}

/// Messages posted to one channel of a class, each with its `id`.
pub async fn channel_messages(
    store: &dyn DocumentStore,
    class_id: &str,
    channel_id: &str,
) -> Result<Vec<Value>, AppError> {
    let filters = [
        ("classId", Value::String(class_id.to_string())),
        ("channelId", Value::String(channel_id.to_string())),
    ];
    let messages = store.find_eq(MESSAGES, &filters, None).await?;
    Ok(messages.into_iter().map(|m| m.into_flat()).collect())
}

/// Documents of a feed collection (assignments, events), optionally limited to one class.
pub async fn list_feed(
    store: &dyn DocumentStore,
    collection: &str,
    class_id: Option<&str>,
) -> Result<Vec<Value>, AppError> {
    let documents = match class_id.filter(|id| !id.is_empty()) {
        Some(class_id) => {
            store
                .find_eq(collection, &[("classId", Value::String(class_id.to_string()))], None)
                .await?
        }
        None => store.list(collection).await?,
    };
    Ok(documents.into_iter().map(|d| d.into_flat()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use crate::models::collection::ASSIGNMENTS;
    use serde_json::json;
    use std::sync::Arc;

    fn fields(value: Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    async fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .insert(CLASSES, "bio", fields(json!({"name": "AP Biology", "channels": []})))
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_add_channel_assigns_id() {
        let store = seeded().await;
        let channel = add_channel(&store, "bio", Some(json!({"name": "labs"}))).await.unwrap();
        assert_eq!(channel.id.len(), 20);

        let class = store.get(CLASSES, "bio").await.unwrap().unwrap();
        assert_eq!(class["channels"], json!([{"id": channel.id, "name": "labs"}]));
        assert!(class["updatedAt"].is_string());
        assert_eq!(class["name"], "AP Biology");
    }

    #[tokio::test]
    async fn test_add_channel_errors() {
        let store = seeded().await;
        let err = add_channel(&store, "bio", Some(json!({"name": ""}))).await.unwrap_err();
        assert_eq!(err.to_string(), "Channel name is required");

        let err = add_channel(&store, "bio", None).await.unwrap_err();
        assert_eq!(err.to_string(), "No channel data provided");

        let err = add_channel(&store, "chem", Some(json!({"name": "labs"}))).await.unwrap_err();
        assert_eq!(err.to_string(), "Class not found");
    }

    #[tokio::test]
    async fn test_concurrent_channel_appends_are_not_lost() {
        let store: Arc<dyn DocumentStore> = Arc::new(seeded().await);

        let tasks: Vec<_> = (0..16)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    add_channel(store.as_ref(), "bio", Some(json!({"name": format!("ch-{}", i)})))
                        .await
                        .unwrap()
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        let class = store.get(CLASSES, "bio").await.unwrap().unwrap();
        assert_eq!(class["channels"].as_array().unwrap().len(), 16);
    }

    #[tokio::test]
    async fn test_add_unit_defaults() {
        let store = seeded().await;
        let unit = add_unit(&store, "bio", Some(json!({"title": "Cells"}))).await.unwrap();
        assert_eq!(unit.status, "draft");
        assert!(!unit.created_at.is_empty());

        let class = store.get(CLASSES, "bio").await.unwrap().unwrap();
        let stored = &class["units"][0];
        assert_eq!(stored["id"], json!(unit.id));
        assert_eq!(stored["associatedFiles"], json!([]));
        assert_eq!(stored["description"], "");

        let err = add_unit(&store, "bio", Some(json!({"description": "no title"}))).await.unwrap_err();
        assert_eq!(err.to_string(), "Unit title is required");
    }

    #[tokio::test]
    async fn test_channel_messages_filter_by_class_and_channel() {
        let store = MemoryStore::new();
        for (id, class_id, channel_id) in [("m1", "bio", "labs"), ("m2", "bio", "general"), ("m3", "chem", "labs")] {
            store
                .insert(MESSAGES, id, fields(json!({"classId": class_id, "channelId": channel_id, "text": id})))
                .await
                .unwrap();
        }

        let messages = channel_messages(&store, "bio", "labs").await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["id"], "m1");
    }

    #[tokio::test]
    async fn test_list_feed_with_and_without_class() {
        let store = MemoryStore::new();
        for (id, class_id) in [("a1", "bio"), ("a2", "chem")] {
            store
                .insert(ASSIGNMENTS, id, fields(json!({"classId": class_id, "title": id})))
                .await
                .unwrap();
        }

        assert_eq!(list_feed(&store, ASSIGNMENTS, None).await.unwrap().len(), 2);
        assert_eq!(list_feed(&store, ASSIGNMENTS, Some("")).await.unwrap().len(), 2);

        let bio = list_feed(&store, ASSIGNMENTS, Some("bio")).await.unwrap();
        assert_eq!(bio, vec![json!({"id": "a1", "classId": "bio", "title": "a1"})]);
    }
}
