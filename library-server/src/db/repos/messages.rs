//! Message repository - direct messages between owners

use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use library_core::models::{Message, MessageFilter, NewMessage, Page, PageRequest};

use super::{window_total, DbError};

const MESSAGE_COLUMNS: &str =
    "id, sender_owner_id, receiver_owner_id, sender_org_id, receiver_org_id, content, read_at, created_at";

fn message_from_row(r: &PgRow) -> Message {
    Message {
        id: r.get("id"),
        sender_owner_id: r.get("sender_owner_id"),
        receiver_owner_id: r.get("receiver_owner_id"),
        sender_org_id: r.get("sender_org_id"),
        receiver_org_id: r.get("receiver_org_id"),
        content: r.get("content"),
        read_at: r.get("read_at"),
        created_at: r.get("created_at"),
    }
}

/// Which side of the conversation a listing belongs to.
#[derive(Debug, Clone, Copy)]
enum Mailbox {
    Inbox,
    Sent,
}

impl Mailbox {
    /// (owner column, counterpart org column)
    fn columns(self) -> (&'static str, &'static str) {
        match self {
            Self::Inbox => ("receiver_owner_id", "sender_org_id"),
            Self::Sent => ("sender_owner_id", "receiver_org_id"),
        }
    }
}

pub struct MessageRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> MessageRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, new: NewMessage) -> Result<Message, DbError> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO messages
                (sender_owner_id, receiver_owner_id, sender_org_id, receiver_org_id, content)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {MESSAGE_COLUMNS}
            "#
        ))
        .bind(new.sender_owner_id)
        .bind(new.receiver_owner_id)
        .bind(new.sender_org_id)
        .bind(new.receiver_org_id)
        .bind(new.content.as_str())
        .fetch_one(self.pool)
        .await?;

        Ok(message_from_row(&row))
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Message>, DbError> {
        let row = sqlx::query(&format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.as_ref().map(message_from_row))
    }

    /// Idempotent: an existing `read_at` is kept.
    pub async fn mark_read(&self, id: Uuid, at: DateTime<Utc>) -> Result<Message, DbError> {
        let row = sqlx::query(&format!(
            "UPDATE messages SET read_at = COALESCE(read_at, $2) WHERE id = $1 RETURNING {MESSAGE_COLUMNS}"
        ))
        .bind(id)
        .bind(at)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("message", id))?;

        Ok(message_from_row(&row))
    }

    pub async fn inbox(&self, owner_id: Uuid, filter: MessageFilter, page: PageRequest) -> Result<Page<Message>, DbError> {
        self.list(Mailbox::Inbox, owner_id, filter, page).await
    }

    pub async fn sent(&self, owner_id: Uuid, filter: MessageFilter, page: PageRequest) -> Result<Page<Message>, DbError> {
        self.list(Mailbox::Sent, owner_id, filter, page).await
    }

    async fn list(
        &self,
        mailbox: Mailbox,
        owner_id: Uuid,
        filter: MessageFilter,
        page: PageRequest,
    ) -> Result<Page<Message>, DbError> {
        let (owner_col, org_col) = mailbox.columns();
        let filters = format!(
            "{owner_col} = $1 AND (NOT $2 OR read_at IS NULL) AND ($3::uuid IS NULL OR {org_col} = $3)"
        );
        let rows = sqlx::query(&format!(
            r#"
            SELECT {MESSAGE_COLUMNS}, COUNT(*) OVER() AS total
            FROM messages
            WHERE {filters}
            ORDER BY created_at DESC, id DESC
            LIMIT $4 OFFSET $5
            "#
        ))
        .bind(owner_id)
        .bind(filter.unread_only)
        .bind(filter.counterpart_org_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        let total = match window_total(&rows, page) {
            Some(total) => total,
            None => {
                sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM messages WHERE {filters}"))
                    .bind(owner_id)
                    .bind(filter.unread_only)
                    .bind(filter.counterpart_org_id)
                    .fetch_one(self.pool)
                    .await?
            }
        };

        Ok(Page {
            total,
            items: rows.iter().map(message_from_row).collect(),
            page: page.page,
            per_page: page.per_page,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repos::testing::{pool, user};
    use chrono::Duration;
    use library_core::models::MessageContent;

    #[test]
    fn mailbox_filters_on_counterpart_org() {
        assert_eq!(Mailbox::Inbox.columns(), ("receiver_owner_id", "sender_org_id"));
        assert_eq!(Mailbox::Sent.columns(), ("sender_owner_id", "receiver_org_id"));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn mark_read_keeps_the_first_timestamp() {
        let pool = pool().await;
        let (_, alice) = user(&pool, "alice").await;
        let (_, bob) = user(&pool, "bob").await;
        let repo = MessageRepo::new(&pool);

        let message = repo
            .create(NewMessage {
                sender_owner_id: alice.id,
                receiver_owner_id: bob.id,
                sender_org_id: None,
                receiver_org_id: None,
                content: MessageContent::new("hi").unwrap(),
            })
            .await
            .unwrap();
        assert!(message.read_at.is_none());

        let first = repo.mark_read(message.id, Utc::now()).await.unwrap();
        let read_at = first.read_at.expect("read_at set");
        assert!(read_at >= message.created_at);

        let second = repo
            .mark_read(message.id, Utc::now() + Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(second.read_at, Some(read_at));

        let unread = MessageFilter {
            unread_only: true,
            ..MessageFilter::default()
        };
        let page = repo.inbox(bob.id, unread, PageRequest::default()).await.unwrap();
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn unknown_message_is_not_found() {
        let pool = pool().await;
        let err = MessageRepo::new(&pool)
            .mark_read(Uuid::new_v4(), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { resource: "message", .. }));
    }
}
