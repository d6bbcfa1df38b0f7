pub mod memory;
pub mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoDB;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::utils::{AppError, StoreError};

/// Field map of a schemaless document.
pub type Fields = Map<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub fields: Fields,
}

impl StoredDocument {
    /// `{id: fields}`, the shape returned by the generic collection reads.
    pub fn into_keyed(self) -> Value {
        let mut keyed = Map::with_capacity(1);
        keyed.insert(self.id, Value::Object(self.fields));
        Value::Object(keyed)
    }

    /// The document fields with its ID injected as `id`.
    pub fn into_flat(self) -> Value {
        let mut fields = self.fields;
        fields.insert("id".to_string(), Value::String(self.id));
        Value::Object(fields)
    }
}

/// Address of one document inside a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocRef {
    pub collection: String,
    pub id: String,
}

impl DocRef {
    pub fn new(collection: &str, id: &str) -> Self {
        Self {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }
}

/// Body of a read-modify-write transaction.
///
/// Receives one slot per target, in order, holding the current fields (or `None`
/// when the document does not exist). Slots left unchanged are not written; a slot
/// set to `None` deletes its document. Returning an error aborts the transaction.
pub type TransactionBody<'a> = dyn FnMut(&mut [Option<Fields>]) -> Result<(), AppError> + Send + 'a;

/// Client for the managed document database.
///
/// Single-document operations are atomic on their own; anything that reads a
/// document and writes it back goes through [`DocumentStore::transact`].
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Allocates a fresh document ID. Also used for embedded sub-object IDs.
    fn allocate_id(&self) -> String {
        new_document_id()
    }

    async fn ping(&self) -> Result<(), StoreError>;

    /// All documents of a collection, in the store's default order.
    async fn list(&self, collection: &str) -> Result<Vec<StoredDocument>, StoreError>;

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Fields>, StoreError>;

    async fn insert(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError>;

    /// Replaces the whole document, creating it when absent.
    /// Returns `true` when a document was already there.
    async fn replace(&self, collection: &str, id: &str, fields: Fields) -> Result<bool, StoreError>;

    /// Merges top-level fields into an existing document.
    /// Returns `false` (and writes nothing) when the document does not exist.
    async fn merge(&self, collection: &str, id: &str, fields: Fields) -> Result<bool, StoreError>;

    /// Returns `false` when there was nothing to delete.
    async fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError>;

    /// Documents whose fields equal every given value.
    async fn find_eq(
        &self,
        collection: &str,
        filters: &[(&str, Value)],
        limit: Option<usize>,
    ) -> Result<Vec<StoredDocument>, StoreError>;

    /// Runs `body` over the target documents and commits its changes atomically.
    async fn transact(&self, targets: &[DocRef], body: &mut TransactionBody<'_>) -> Result<(), AppError>;
}

/// 20 alphanumeric characters taken from a v4 UUID.
pub fn new_document_id() -> String {
    const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

    let a = uuid::Uuid::new_v4().as_u128();
    let b = uuid::Uuid::new_v4().as_u128();
    let mut seed = a ^ b.rotate_left(64);

    (0..20)
        .map(|_| {
            let idx = (seed % ALPHABET.len() as u128) as usize;
            seed /= ALPHABET.len() as u128;
            ALPHABET[idx] as char
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_document_ids_are_alphanumeric_and_distinct() {
        let ids: HashSet<String> = (0..500).map(|_| new_document_id()).collect();
        assert_eq!(ids.len(), 500);
        for id in &ids {
            assert_eq!(id.len(), 20);
            assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
        }
    }

    #[test]
    fn test_document_shapes() {
        let mut fields = Fields::new();
        fields.insert("username".into(), Value::from("ana"));
        let doc = StoredDocument { id: "abc".into(), fields };

        assert_eq!(doc.clone().into_keyed(), serde_json::json!({"abc": {"username": "ana"}}));
        assert_eq!(doc.into_flat(), serde_json::json!({"id": "abc", "username": "ana"}));
    }
}
