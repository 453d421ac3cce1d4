//! Follow endpoint

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::post, Router};
use serde::Deserialize;
use uuid::Uuid;

use library_core::models::Follow;

use crate::auth::Actor;
use crate::http::error::ApiResult;
use crate::http::extractors::ValidJson;
use crate::http::response::Envelope;
use crate::services::follows;
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowRequest {
    pub following_owner_id: Uuid,
}

/// POST /follows - the active owner follows `followingOwnerId`
async fn create_follow(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    ValidJson(req): ValidJson<FollowRequest>,
) -> ApiResult<(StatusCode, Envelope<Follow>)> {
    let follow = follows::follow(state.store.as_ref(), &actor.owner, req.following_owner_id).await?;
    Ok(Envelope::created(follow))
}

/// Follow routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/follows", post(create_follow))
}
