//! Topic taxonomy

use uuid::Uuid;

use library_core::models::{build_tree, NewTopic, Topic, TopicNode};

use crate::db::Store;
use crate::http::error::{ApiError, ApiResult};

pub async fn create_topic(store: &dyn Store, name: &str, parent_id: Option<Uuid>) -> ApiResult<Topic> {
    let new = NewTopic::new(name, parent_id)?;
    if let Some(parent) = parent_id {
        if store.get_topic(parent).await?.is_none() {
            return Err(ApiError::not_found("topic", parent));
        }
    }

    let topic = store.create_topic(new).await?;
    tracing::info!(topic_id = %topic.id, slug = %topic.slug, "topic created");
    Ok(topic)
}

pub async fn list_topics(store: &dyn Store) -> ApiResult<Vec<Topic>> {
    Ok(store.list_topics().await?)
}

pub async fn topic_tree(store: &dyn Store) -> ApiResult<Vec<TopicNode>> {
    let topics = store.list_topics().await?;
    Ok(build_tree(&topics))
}
