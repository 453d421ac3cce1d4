//! Topic taxonomy endpoints

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Router,
};
use serde::Deserialize;
use uuid::Uuid;

use library_core::models::{Topic, TopicNode};

use crate::auth::Session;
use crate::http::error::ApiResult;
use crate::http::extractors::ValidJson;
use crate::http::response::Envelope;
use crate::services::topics;
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTopicRequest {
    pub name: String,
    pub parent_id: Option<Uuid>,
}

/// GET /topics
async fn list_topics(State(state): State<Arc<AppState>>) -> ApiResult<Envelope<Vec<Topic>>> {
    Ok(Envelope::ok(topics::list_topics(state.store.as_ref()).await?))
}

/// GET /topics/tree
async fn topic_tree(State(state): State<Arc<AppState>>) -> ApiResult<Envelope<Vec<TopicNode>>> {
    Ok(Envelope::ok(topics::topic_tree(state.store.as_ref()).await?))
}

/// POST /topics
async fn create_topic(
    State(state): State<Arc<AppState>>,
    _session: Session,
    ValidJson(req): ValidJson<CreateTopicRequest>,
) -> ApiResult<(StatusCode, Envelope<Topic>)> {
    let topic = topics::create_topic(state.store.as_ref(), &req.name, req.parent_id).await?;
    Ok(Envelope::created(topic))
}

/// Topic routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/topics", get(list_topics).post(create_topic))
        .route("/topics/tree", get(topic_tree))
}
