//! Message endpoints

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, patch, post},
    Router,
};
use serde::Deserialize;
use uuid::Uuid;

use library_core::models::{Message, MessageFilter, Page, PageParams, PageRequest};

use crate::auth::Actor;
use crate::http::error::ApiResult;
use crate::http::extractors::{ValidJson, ValidQuery, ValidUuid};
use crate::http::response::Envelope;
use crate::services::messages;
use crate::state::AppState;

/// Send message request
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub receiver_owner_id: Uuid,
    pub content: String,
}

/// `?unread=true&orgId=...&page=1&perPage=20`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MailboxParams {
    #[serde(default)]
    pub unread: bool,
    pub org_id: Option<Uuid>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl MailboxParams {
    fn split(self) -> (MessageFilter, PageRequest) {
        let filter = MessageFilter {
            unread_only: self.unread,
            counterpart_org_id: self.org_id,
        };
        let page = PageParams {
            page: self.page,
            per_page: self.per_page,
        };
        (filter, page.into())
    }
}

/// POST /messages
async fn send_message(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    ValidJson(req): ValidJson<SendMessageRequest>,
) -> ApiResult<(StatusCode, Envelope<Message>)> {
    let message = messages::send_message(state.store.as_ref(), &actor.owner, req.receiver_owner_id, &req.content).await?;
    Ok(Envelope::created(message))
}

/// PATCH /messages/{id}/read
async fn mark_read(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    ValidUuid(id): ValidUuid,
) -> ApiResult<Envelope<Message>> {
    let message = messages::mark_read(state.store.as_ref(), id, &actor.owner).await?;
    Ok(Envelope::ok(message))
}

/// GET /messages/inbox
async fn inbox(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    ValidQuery(params): ValidQuery<MailboxParams>,
) -> ApiResult<Envelope<Page<Message>>> {
    let (filter, page) = params.split();
    let page = messages::inbox(state.store.as_ref(), &actor.owner, filter, page).await?;
    Ok(Envelope::ok(page))
}

/// GET /messages/sent
async fn sent(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    ValidQuery(params): ValidQuery<MailboxParams>,
) -> ApiResult<Envelope<Page<Message>>> {
    let (filter, page) = params.split();
    let page = messages::sent(state.store.as_ref(), &actor.owner, filter, page).await?;
    Ok(Envelope::ok(page))
}

/// Message routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/messages", post(send_message))
        .route("/messages/inbox", get(inbox))
        .route("/messages/sent", get(sent))
        .route("/messages/{id}/read", patch(mark_read))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mailbox_params_default_to_everything() {
        let (filter, page) = MailboxParams::default().split();
        assert_eq!(filter, MessageFilter::default());
        assert_eq!(page, PageRequest::default());
    }
}
