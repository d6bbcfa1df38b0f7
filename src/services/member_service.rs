use serde::Deserialize;
use serde_json::Value;

use crate::database::{DocRef, DocumentStore, Fields};
use crate::models::collection::{validate_document_id, validate_payload, CollectionName, WriteMode, MEMBERS};
use crate::models::member::{strip_sensitive, Member};
use crate::services::document_service::require_fields;
use crate::utils::{now_timestamp, AppError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassOperation {
    Add,
    Update,
}

impl ClassOperation {
    pub fn parse(op: Option<&str>) -> Result<Self, AppError> {
        match op.unwrap_or("add") {
            "add" => Ok(ClassOperation::Add),
            "update" => Ok(ClassOperation::Update),
            other => Err(AppError::bad_request(format!("Unknown class operation: {}", other))),
        }
    }

    pub fn past_tense(&self) -> &'static str {
        match self {
            ClassOperation::Add => "added",
            ClassOperation::Update => "updated",
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ManageClassBody {
    class_data: Option<Fields>,
    operation: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoveClassBody {
    class_id: Option<Value>,
}

fn parse_body<T: serde::de::DeserializeOwned>(body: Option<Value>) -> Result<T, AppError> {
    let fields = require_fields(body)?;
    serde_json::from_value(Value::Object(fields)).map_err(|e| AppError::bad_request(e.to_string()))
}

async fn load_member(store: &dyn DocumentStore, user_id: &str) -> Result<Fields, AppError> {
    validate_document_id(user_id)?;
    store
        .get(MEMBERS, user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))
}

/// Profile fields with credentials removed.
pub async fn get_profile(store: &dyn DocumentStore, user_id: &str) -> Result<Fields, AppError> {
    let mut fields = load_member(store, user_id).await?;
    strip_sensitive(&mut fields);
    Ok(fields)
}

pub async fn update_profile(store: &dyn DocumentStore, user_id: &str, body: Option<Value>) -> Result<(), AppError> {
    let fields = require_fields(body)?;
    validate_document_id(user_id)?;
    let members = CollectionName::parse(MEMBERS)?;
    validate_payload(&members, &fields, WriteMode::Merge)?;

    if store.merge(MEMBERS, user_id, fields).await? {
        Ok(())
    } else {
        Err(AppError::not_found("User not found"))
    }
}

pub async fn list_classes(store: &dyn DocumentStore, user_id: &str) -> Result<Vec<Fields>, AppError> {
    let member = Member::from_fields(load_member(store, user_id).await?)?;
    Ok(member.classes)
}

/// Runs `edit` on the member inside a transaction and stamps `updatedAt`.
async fn edit_member<F>(store: &dyn DocumentStore, user_id: &str, mut edit: F) -> Result<(), AppError>
where
    F: FnMut(&mut Member) -> Result<(), AppError> + Send,
{
    validate_document_id(user_id)?;
    let targets = [DocRef::new(MEMBERS, user_id)];

    store
        .transact(&targets, &mut |slots: &mut [Option<Fields>]| -> Result<(), AppError> {
            let fields = slots[0].take().ok_or_else(|| AppError::not_found("User not found"))?;
            let mut member = Member::from_fields(fields)?;
            edit(&mut member)?;
            member
                .profile
                .insert("updatedAt".to_string(), Value::String(now_timestamp()));
            slots[0] = Some(member.into_fields()?);
            Ok(())
        })
        .await
}

/// Adds or updates one entry of the member's `classes` array.
///
/// Returns the operation performed and the class data as stored.
pub async fn manage_class(
    store: &dyn DocumentStore,
    user_id: &str,
    body: Option<Value>,
) -> Result<(ClassOperation, Fields), AppError> {
    let request: ManageClassBody = parse_body(body)?;
    let class_data = request
        .class_data
        .ok_or_else(|| AppError::bad_request("No class data provided"))?;
    let operation = ClassOperation::parse(request.operation.as_deref())?;

    let stored = class_data.clone();
    edit_member(store, user_id, move |member| match operation {
        ClassOperation::Add => {
            member.upsert_class(class_data.clone());
            Ok(())
        }
        ClassOperation::Update => {
            if member.replace_class(class_data.clone()) {
                Ok(())
            } else {
                Err(AppError::not_found("Class not found"))
            }
        }
    })
    .await?;

    Ok((operation, stored))
}

/// Removes the class with the given ID, keeping the remaining entries in order.
pub async fn remove_class(store: &dyn DocumentStore, user_id: &str, body: Option<Value>) -> Result<(), AppError> {
    let request: RemoveClassBody = parse_body(body)?;
    let class_id = match request.class_id {
        Some(Value::Null) | None => return Err(AppError::bad_request("No class ID provided")),
        Some(id) => id,
    };

    edit_member(store, user_id, move |member| {
        if member.remove_class(&class_id) == 0 {
            Err(AppError::not_found("Class not found"))
        } else {
            Ok(())
        }
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use serde_json::json;

    async fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        let fields = json!({
            "username": "ana",
            "password": "hash",
            "verification_code": "123456",
            "classes": [{"id": "1", "name": "Bio"}, {"id": "2", "name": "Chem"}, {"id": "3", "name": "Math"}]
        });
        store
            .insert(MEMBERS, "m1", fields.as_object().cloned().unwrap())
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_profile_hides_credentials() {
        let store = seeded().await;
        let profile = get_profile(&store, "m1").await.unwrap();
        assert_eq!(profile["username"], "ana");
        assert!(profile.get("password").is_none());
        assert!(profile.get("verification_code").is_none());

        assert!(matches!(get_profile(&store, "nobody").await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_update_profile() {
        let store = seeded().await;
        update_profile(&store, "m1", Some(json!({"bio": "likes cells"}))).await.unwrap();
        assert_eq!(get_profile(&store, "m1").await.unwrap()["bio"], "likes cells");

        let err = update_profile(&store, "ghost", Some(json!({"bio": "x"}))).await.unwrap_err();
        assert_eq!(err.to_string(), "User not found");
    }

    #[tokio::test]
    async fn test_add_class_appends_or_replaces() {
        let store = seeded().await;

        let (op, _) = manage_class(&store, "m1", Some(json!({"classData": {"id": "4", "name": "Physics"}})))
            .await
            .unwrap();
        assert_eq!(op, ClassOperation::Add);
        assert_eq!(list_classes(&store, "m1").await.unwrap().len(), 4);

        manage_class(&store, "m1", Some(json!({"classData": {"id": "1", "name": "AP Bio"}})))
            .await
            .unwrap();
        let classes = list_classes(&store, "m1").await.unwrap();
        assert_eq!(classes.len(), 4);
        assert_eq!(classes[0]["name"], "AP Bio");

        let profile = get_profile(&store, "m1").await.unwrap();
        assert!(profile["updatedAt"].is_string());
    }

    #[tokio::test]
    async fn test_update_unknown_class() {
        let store = seeded().await;
        let err = manage_class(
            &store,
            "m1",
            Some(json!({"classData": {"id": "9", "name": "Art"}, "operation": "update"})),
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "Class not found");

        let err = manage_class(&store, "m1", Some(json!({"operation": "add"}))).await.unwrap_err();
        assert_eq!(err.to_string(), "No class data provided");
    }

    #[tokio::test]
    async fn test_remove_class_shrinks_by_one_in_order() {
        let store = seeded().await;
        remove_class(&store, "m1", Some(json!({"classId": "2"}))).await.unwrap();

        let names: Vec<_> = list_classes(&store, "m1")
            .await
            .unwrap()
            .into_iter()
            .map(|c| c["name"].clone())
            .collect();
        assert_eq!(names, vec![json!("Bio"), json!("Math")]);

        let err = remove_class(&store, "m1", Some(json!({"classId": "2"}))).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
