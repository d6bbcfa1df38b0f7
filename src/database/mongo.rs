use async_trait::async_trait;
use futures::stream::StreamExt;
use mongodb::bson::{doc, Bson, Document};
use mongodb::{Client, ClientSession, Collection, Database, IndexModel};
use serde_json::Value;
use std::time::Duration;

use super::{DocRef, DocumentStore, Fields, StoredDocument, TransactionBody};
use crate::models::collection::{ASSIGNMENTS, EVENTS, MEMBERS, MESSAGES};
use crate::utils::{AppError, StoreError};

#[derive(Clone)]
pub struct MongoDB {
    client: Client,
    db: Database,
}

impl MongoDB {
    /// Connects and selects `db_name` through the driver's multi-database API.
    pub async fn new(uri: &str, db_name: &str) -> Result<Self, StoreError> {
        let mut client_options = mongodb::options::ClientOptions::parse(uri).await?;

        client_options.max_pool_size = Some(20);
        client_options.min_pool_size = Some(5);
        client_options.max_idle_time = Some(Duration::from_secs(300));

        client_options.connect_timeout = Some(Duration::from_secs(5));
        client_options.server_selection_timeout = Some(Duration::from_secs(5));

        let client = Client::with_options(client_options)?;
        let db = client.database(db_name);

        // Test connection
        db.list_collection_names().await?;

        let mongodb = Self { client, db };
        mongodb.ensure_indexes().await?;

        Ok(mongodb)
    }

    /// Indexes backing the equality queries of the domain routes.
    async fn ensure_indexes(&self) -> Result<(), StoreError> {
        log::info!("🔧 Creating database indexes...");

        let indexes = [
            (MEMBERS, doc! { "username": 1 }),
            (MESSAGES, doc! { "classId": 1, "channelId": 1 }),
            (ASSIGNMENTS, doc! { "classId": 1 }),
            (EVENTS, doc! { "classId": 1 }),
        ];

        for (collection, keys) in indexes {
            let label = format!("{}({})", collection, keys.keys().cloned().collect::<Vec<_>>().join(", "));
            let index = IndexModel::builder().keys(keys).build();

            match self.collection(collection).create_index(index).await {
                Ok(_) => log::info!("   ✅ Index created: {}", label),
                Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
            }
        }

        log::info!("✅ Database indexes ready");

        Ok(())
    }

    pub fn collection(&self, name: &str) -> Collection<Document> {
        self.db.collection(name)
    }

    async fn load_targets(
        &self,
        session: &mut ClientSession,
        targets: &[DocRef],
        body: &mut TransactionBody<'_>,
    ) -> Result<(), AppError> {
        let mut before = Vec::with_capacity(targets.len());
        for target in targets {
            let found = self
                .collection(&target.collection)
                .find_one(doc! { "_id": target.id.as_str() })
                .session(&mut *session)
                .await
                .map_err(StoreError::from)?;
            before.push(found.map(document_to_fields).transpose()?.map(|(_, fields)| fields));
        }

        let mut after = before.clone();
        body(after.as_mut_slice())?;

        for ((target, old), new) in targets.iter().zip(&before).zip(after) {
            if *old == new {
                continue;
            }
            let collection = self.collection(&target.collection);
            match new {
                Some(fields) => {
                    collection
                        .replace_one(doc! { "_id": target.id.as_str() }, fields_to_document(&target.id, &fields)?)
                        .upsert(true)
                        .session(&mut *session)
                        .await
                        .map_err(StoreError::from)?;
                }
                None => {
                    collection
                        .delete_one(doc! { "_id": target.id.as_str() })
                        .session(&mut *session)
                        .await
                        .map_err(StoreError::from)?;
                }
            }
        }

        Ok(())
    }
}

/// Splits a stored BSON document into its `_id` and JSON fields.
fn document_to_fields(mut document: Document) -> Result<(String, Fields), StoreError> {
    let id = match document.remove("_id") {
        Some(Bson::String(id)) => id,
        Some(Bson::ObjectId(oid)) => oid.to_hex(),
        Some(other) => other.to_string(),
        None => return Err(StoreError::Codec("document without _id".into())),
    };

    match Bson::Document(document).into_relaxed_extjson() {
        Value::Object(fields) => Ok((id, fields)),
        other => Err(StoreError::Codec(format!("expected an object, got {}", other))),
    }
}

fn fields_to_document(id: &str, fields: &Fields) -> Result<Document, StoreError> {
    let mut document = mongodb::bson::to_document(fields)?;
    document.insert("_id", id);
    Ok(document)
}

fn filter_document(filters: &[(&str, Value)]) -> Result<Document, StoreError> {
    let mut filter = Document::new();
    for (field, value) in filters {
        filter.insert(*field, mongodb::bson::to_bson(value)?);
    }
    Ok(filter)
}

async fn collect_documents(
    mut cursor: mongodb::Cursor<Document>,
) -> Result<Vec<StoredDocument>, StoreError> {
    let mut documents = Vec::new();
    while let Some(result) = cursor.next().await {
        let (id, fields) = document_to_fields(result?)?;
        documents.push(StoredDocument { id, fields });
    }
    Ok(documents)
}

#[async_trait]
impl DocumentStore for MongoDB {
    async fn ping(&self) -> Result<(), StoreError> {
        self.db.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }

    async fn list(&self, collection: &str) -> Result<Vec<StoredDocument>, StoreError> {
        let cursor = self.collection(collection).find(doc! {}).await?;
        collect_documents(cursor).await
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Fields>, StoreError> {
        let found = self.collection(collection).find_one(doc! { "_id": id }).await?;
        Ok(found.map(document_to_fields).transpose()?.map(|(_, fields)| fields))
    }

    async fn insert(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        self.collection(collection)
            .insert_one(fields_to_document(id, &fields)?)
            .await?;
        Ok(())
    }

    async fn replace(&self, collection: &str, id: &str, fields: Fields) -> Result<bool, StoreError> {
        let result = self
            .collection(collection)
            .replace_one(doc! { "_id": id }, fields_to_document(id, &fields)?)
            .upsert(true)
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn merge(&self, collection: &str, id: &str, fields: Fields) -> Result<bool, StoreError> {
        let coll = self.collection(collection);
        if fields.is_empty() {
            return Ok(coll.find_one(doc! { "_id": id }).await?.is_some());
        }

        let update = mongodb::bson::to_document(&fields)?;
        let result = coll.update_one(doc! { "_id": id }, doc! { "$set": update }).await?;
        Ok(result.matched_count > 0)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError> {
        let result = self.collection(collection).delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count > 0)
    }

    async fn find_eq(
        &self,
        collection: &str,
        filters: &[(&str, Value)],
        limit: Option<usize>,
    ) -> Result<Vec<StoredDocument>, StoreError> {
        let filter = filter_document(filters)?;
        let cursor = match limit {
            Some(n) => self.collection(collection).find(filter).limit(n as i64).await?,
            None => self.collection(collection).find(filter).await?,
        };
        collect_documents(cursor).await
    }

    async fn transact(&self, targets: &[DocRef], body: &mut TransactionBody<'_>) -> Result<(), AppError> {
        let mut session = self.client.start_session().await.map_err(StoreError::from)?;
        session
            .start_transaction()
            .await
            .map_err(|e| StoreError::Transaction(e.to_string()))?;

        match self.load_targets(&mut session, targets, body).await {
            Ok(()) => {
                session
                    .commit_transaction()
                    .await
                    .map_err(|e| StoreError::Transaction(e.to_string()))?;
                Ok(())
            }
            Err(e) => {
                if let Err(abort_err) = session.abort_transaction().await {
                    log::warn!("⚠️  Failed to abort transaction: {}", abort_err);
                }
                Err(e)
            }
        }
    }
}
