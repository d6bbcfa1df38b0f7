use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use super::{DocRef, DocumentStore, Fields, StoredDocument, TransactionBody};
use crate::utils::{AppError, StoreError};

type Collections = HashMap<String, BTreeMap<String, Fields>>;

/// Process-local store for development (`STORE_BACKEND=memory`) and tests.
///
/// Documents iterate in ID order. Transactions hold the lock for the whole body.
#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Collections>, StoreError> {
        self.collections
            .lock()
            .map_err(|_| StoreError::Database("memory store lock poisoned".into()))
    }
}

fn matches(fields: &Fields, filters: &[(&str, Value)]) -> bool {
    filters
        .iter()
        .all(|(field, expected)| fields.get(*field) == Some(expected))
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.lock().map(|_| ())
    }

    async fn list(&self, collection: &str) -> Result<Vec<StoredDocument>, StoreError> {
        let collections = self.lock()?;
        Ok(collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, fields)| StoredDocument { id: id.clone(), fields: fields.clone() })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Fields>, StoreError> {
        let collections = self.lock()?;
        Ok(collections.get(collection).and_then(|docs| docs.get(id)).cloned())
    }

    async fn insert(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        let mut collections = self.lock()?;
        let docs = collections.entry(collection.to_string()).or_default();
        if docs.contains_key(id) {
            return Err(StoreError::Database(format!("duplicate document id {}", id)));
        }
        docs.insert(id.to_string(), fields);
        Ok(())
    }

    async fn replace(&self, collection: &str, id: &str, fields: Fields) -> Result<bool, StoreError> {
        let mut collections = self.lock()?;
        let previous = collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), fields);
        Ok(previous.is_some())
    }

    async fn merge(&self, collection: &str, id: &str, fields: Fields) -> Result<bool, StoreError> {
        let mut collections = self.lock()?;
        match collections.get_mut(collection).and_then(|docs| docs.get_mut(id)) {
            Some(existing) => {
                existing.extend(fields);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError> {
        let mut collections = self.lock()?;
        Ok(collections
            .get_mut(collection)
            .and_then(|docs| docs.remove(id))
            .is_some())
    }

    async fn find_eq(
        &self,
        collection: &str,
        filters: &[(&str, Value)],
        limit: Option<usize>,
    ) -> Result<Vec<StoredDocument>, StoreError> {
        let collections = self.lock()?;
        let Some(docs) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        Ok(docs
            .iter()
            .filter(|(_, fields)| matches(fields, filters))
            .take(limit.unwrap_or(usize::MAX))
            .map(|(id, fields)| StoredDocument { id: id.clone(), fields: fields.clone() })
            .collect())
    }

    async fn transact(&self, targets: &[DocRef], body: &mut TransactionBody<'_>) -> Result<(), AppError> {
        let mut collections = self.lock()?;

        let mut slots: Vec<Option<Fields>> = targets
            .iter()
            .map(|t| collections.get(&t.collection).and_then(|docs| docs.get(&t.id)).cloned())
            .collect();

        body(slots.as_mut_slice())?;

        for (target, slot) in targets.iter().zip(slots) {
            let docs = collections.entry(target.collection.clone()).or_default();
            match slot {
                Some(fields) => {
                    docs.insert(target.id.clone(), fields);
                }
                None => {
                    docs.remove(&target.id);
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_replace_reports_previous_existence() {
        let store = MemoryStore::new();
        assert!(!store.replace("Trees", "u1", fields(json!({"nodes": []}))).await.unwrap());
        assert!(store.replace("Trees", "u1", fields(json!({"nodes": [1]}))).await.unwrap());
        assert_eq!(store.get("Trees", "u1").await.unwrap(), Some(fields(json!({"nodes": [1]}))));
    }

    #[tokio::test]
    async fn test_merge_requires_existing_document() {
        let store = MemoryStore::new();
        assert!(!store.merge("Members", "m1", fields(json!({"bio": "hi"}))).await.unwrap());

        store.insert("Members", "m1", fields(json!({"username": "ana"}))).await.unwrap();
        assert!(store.merge("Members", "m1", fields(json!({"bio": "hi"}))).await.unwrap());
        assert_eq!(
            store.get("Members", "m1").await.unwrap(),
            Some(fields(json!({"username": "ana", "bio": "hi"})))
        );
    }

    #[tokio::test]
    async fn test_find_eq_with_limit() {
        let store = MemoryStore::new();
        for (id, class_id) in [("a", "c1"), ("b", "c2"), ("c", "c1")] {
            store.insert("Events", id, fields(json!({"classId": class_id}))).await.unwrap();
        }

        let found = store.find_eq("Events", &[("classId", json!("c1"))], None).await.unwrap();
        assert_eq!(found.iter().map(|d| d.id.as_str()).collect::<Vec<_>>(), vec!["a", "c"]);

        let limited = store.find_eq("Events", &[("classId", json!("c1"))], Some(1)).await.unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_transaction_writes_nothing() {
        let store = MemoryStore::new();
        store.insert("Members", "a", fields(json!({"friends": []}))).await.unwrap();

        let result = store
            .transact(&[DocRef::new("Members", "a")], &mut |slots: &mut [Option<Fields>]| -> Result<(), AppError> {
                if let Some(doc) = slots[0].as_mut() {
                    doc.insert("friends".into(), json!(["b"]));
                }
                Err(AppError::bad_request("nope"))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(store.get("Members", "a").await.unwrap(), Some(fields(json!({"friends": []}))));
    }
}
