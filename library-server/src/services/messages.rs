//! Direct messages between owners

use chrono::Utc;
use uuid::Uuid;

use library_core::models::{Message, MessageContent, MessageFilter, NewMessage, Owner, Page, PageRequest};

use crate::db::Store;
use crate::http::error::{ApiError, ApiResult};

/// Send `content` from `sender` to `receiver_id`.
///
/// Both parties' backing org ids are copied onto the message so listings
/// can filter by org without a join.
pub async fn send_message(store: &dyn Store, sender: &Owner, receiver_id: Uuid, content: &str) -> ApiResult<Message> {
    let content = MessageContent::new(content)?;
    if sender.id == receiver_id {
        return Err(ApiError::bad_request("cannot message yourself"));
    }

    let receiver = store
        .get_owner(receiver_id)
        .await?
        .ok_or_else(|| ApiError::not_found("owner", receiver_id))?;

    let message = store
        .create_message(NewMessage {
            sender_owner_id: sender.id,
            receiver_owner_id: receiver.id,
            sender_org_id: sender.org_id(),
            receiver_org_id: receiver.org_id(),
            content,
        })
        .await?;

    tracing::info!(message_id = %message.id, sender = %sender.id, receiver = %receiver.id, "message sent");
    Ok(message)
}

/// Mark a message read. Only the receiver may; repeating keeps the first `read_at`.
pub async fn mark_read(store: &dyn Store, message_id: Uuid, requester: &Owner) -> ApiResult<Message> {
    let message = store
        .get_message(message_id)
        .await?
        .ok_or_else(|| ApiError::not_found("message", message_id))?;

    if message.receiver_owner_id != requester.id {
        return Err(ApiError::forbidden("only the receiver can mark a message read"));
    }
    if message.is_read() {
        return Ok(message);
    }

    Ok(store.mark_message_read(message_id, Utc::now()).await?)
}

pub async fn inbox(store: &dyn Store, owner: &Owner, filter: MessageFilter, page: PageRequest) -> ApiResult<Page<Message>> {
    Ok(store.inbox(owner.id, filter, page).await?)
}

pub async fn sent(store: &dyn Store, owner: &Owner, filter: MessageFilter, page: PageRequest) -> ApiResult<Page<Message>> {
    Ok(store.sent(owner.id, filter, page).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::services::testing::{org, user};

    #[tokio::test]
    async fn empty_content_is_bad_request() {
        let store = MemoryStore::new();
        let (_, alice) = user(&store, "alice").await;
        let (_, bob) = user(&store, "bob").await;

        for content in ["", "   \n\t"] {
            let err = send_message(&store, &alice, bob.id, content).await.unwrap_err();
            assert!(matches!(err, ApiError::Validation(_)));
        }
        let long = "x".repeat(10_001);
        assert!(send_message(&store, &alice, bob.id, &long).await.is_err());
    }

    #[tokio::test]
    async fn self_send_and_unknown_receiver() {
        let store = MemoryStore::new();
        let (_, alice) = user(&store, "alice").await;

        let err = send_message(&store, &alice, alice.id, "hi").await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest { .. }));

        let err = send_message(&store, &alice, Uuid::new_v4(), "hi").await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound { .. }));
    }

    #[tokio::test]
    async fn org_ids_are_denormalized() {
        let store = MemoryStore::new();
        let (alice, alice_owner) = user(&store, "alice").await;
        let (acme, acme_owner) = org(&store, &alice, "acme").await;

        let message = send_message(&store, &acme_owner, alice_owner.id, "welcome").await.unwrap();
        assert_eq!(message.sender_org_id, Some(acme.id));
        assert_eq!(message.receiver_org_id, None);

        let filter = MessageFilter {
            counterpart_org_id: Some(acme.id),
            ..MessageFilter::default()
        };
        let page = inbox(&store, &alice_owner, filter, PageRequest::default()).await.unwrap();
        assert_eq!(page.total, 1);
    }

    #[tokio::test]
    async fn mark_read_by_non_receiver_is_forbidden() {
        let store = MemoryStore::new();
        let (_, alice) = user(&store, "alice").await;
        let (_, bob) = user(&store, "bob").await;
        let message = send_message(&store, &alice, bob.id, "hi").await.unwrap();

        let err = mark_read(&store, message.id, &alice).await.unwrap_err();
        assert!(matches!(err, ApiError::Forbidden { .. }));
    }

    #[tokio::test]
    async fn mark_read_is_idempotent() {
        let store = MemoryStore::new();
        let (_, alice) = user(&store, "alice").await;
        let (_, bob) = user(&store, "bob").await;
        let message = send_message(&store, &alice, bob.id, "hi").await.unwrap();
        assert!(message.read_at.is_none());

        let first = mark_read(&store, message.id, &bob).await.unwrap();
        let second = mark_read(&store, message.id, &bob).await.unwrap();
        let read_at = first.read_at.unwrap();
        assert!(read_at >= message.created_at);
        assert_eq!(second.read_at, Some(read_at));

        let unread = MessageFilter {
            unread_only: true,
            ..MessageFilter::default()
        };
        let page = inbox(&store, &bob, unread, PageRequest::default()).await.unwrap();
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    async fn unknown_message_is_not_found() {
        let store = MemoryStore::new();
        let (_, alice) = user(&store, "alice").await;
        let err = mark_read(&store, Uuid::new_v4(), &alice).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound { resource: "message", .. }));
    }
}
