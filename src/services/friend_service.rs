use serde::Deserialize;
use serde_json::Value;

use crate::database::{DocRef, DocumentStore, Fields};
use crate::models::collection::{validate_document_id, MEMBERS};
use crate::models::member::{strip_sensitive, Member};
use crate::utils::AppError;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddFriendBody {
    friend_username: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoveFriendBody {
    friend_id: Option<String>,
}

fn parse_body<T: serde::de::DeserializeOwned + Default>(body: Option<Value>) -> Result<T, AppError> {
    match body {
        None | Some(Value::Null) => Ok(T::default()),
        Some(value) => serde_json::from_value(value).map_err(|e| AppError::bad_request(e.to_string())),
    }
}

/// Profiles of the member's friends, each with its `id`. Dangling IDs are skipped.
pub async fn list_friends(store: &dyn DocumentStore, user_id: &str) -> Result<Vec<Value>, AppError> {
    validate_document_id(user_id)?;
    let fields = store
        .get(MEMBERS, user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;
    let member = Member::from_fields(fields)?;

    let mut friends = Vec::with_capacity(member.friends.len());
    for friend_id in &member.friends {
        if let Some(mut friend) = store.get(MEMBERS, friend_id).await? {
            strip_sensitive(&mut friend);
            friend.insert("id".to_string(), Value::String(friend_id.clone()));
            friends.push(Value::Object(friend));
        }
    }
    Ok(friends)
}

/// Befriends the member named `friendUsername`, updating both friend lists in one transaction.
///
/// Returns the friend's document ID.
pub async fn add_friend(store: &dyn DocumentStore, user_id: &str, body: Option<Value>) -> Result<String, AppError> {
    let request: AddFriendBody = parse_body(body)?;
    let username = request
        .friend_username
        .filter(|u| !u.is_empty())
        .ok_or_else(|| AppError::bad_request("No username provided"))?;
    validate_document_id(user_id)?;

    if store.get(MEMBERS, user_id).await?.is_none() {
        return Err(AppError::not_found("User not found"));
    }

    let friend_id = store
        .find_eq(MEMBERS, &[("username", Value::String(username))], Some(1))
        .await?
        .into_iter()
        .next()
        .map(|doc| doc.id)
        .ok_or_else(|| AppError::not_found("Friend not found"))?;

    if friend_id == user_id {
        return Err(AppError::bad_request("Cannot add yourself as a friend"));
    }

    let targets = [DocRef::new(MEMBERS, user_id), DocRef::new(MEMBERS, &friend_id)];
    store
        .transact(&targets, &mut |slots: &mut [Option<Fields>]| -> Result<(), AppError> {
            let (user_slot, friend_slot) = slots.split_at_mut(1);
            let mut user = Member::from_fields(
                user_slot[0].take().ok_or_else(|| AppError::not_found("User not found"))?,
            )?;
            let mut friend = Member::from_fields(
                friend_slot[0].take().ok_or_else(|| AppError::not_found("Friend not found"))?,
            )?;

            if !user.add_friend(&friend_id) {
                return Err(AppError::bad_request("Already friends with this user"));
            }
            friend.add_friend(user_id);

            user_slot[0] = Some(user.into_fields()?);
            friend_slot[0] = Some(friend.into_fields()?);
            Ok(())
        })
        .await?;

    log::info!("🤝 {} and {} are now friends", user_id, friend_id);
    Ok(friend_id)
}

/// Removes the friendship in both directions in one transaction.
///
/// The friend's side is skipped when the friend document no longer exists.
pub async fn remove_friend(store: &dyn DocumentStore, user_id: &str, body: Option<Value>) -> Result<(), AppError> {
    let request: RemoveFriendBody = parse_body(body)?;
    let friend_id = request
        .friend_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::bad_request("No friend ID provided"))?;
    validate_document_id(user_id)?;
    validate_document_id(&friend_id)?;

    let targets = [DocRef::new(MEMBERS, user_id), DocRef::new(MEMBERS, &friend_id)];
    store
        .transact(&targets, &mut |slots: &mut [Option<Fields>]| -> Result<(), AppError> {
            let mut user = Member::from_fields(
                slots[0].take().ok_or_else(|| AppError::not_found("User not found"))?,
            )?;
            if !user.remove_friend(&friend_id) {
                return Err(AppError::bad_request("Friend not in friend list"));
            }
            slots[0] = Some(user.into_fields()?);

            if let Some(fields) = slots[1].take() {
                let mut friend = Member::from_fields(fields)?;
                friend.remove_friend(user_id);
                slots[1] = Some(friend.into_fields()?);
            }
            Ok(())
        })
        .await?;

    log::info!("👋 {} removed friend {}", user_id, friend_id);
    Ok(())
}
