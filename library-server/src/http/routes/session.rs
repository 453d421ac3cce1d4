//! Switching the active owner

use std::sync::Arc;

use axum::{extract::State, routing::post, Router};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use library_core::models::OwnerSummary;

use crate::auth::Session;
use crate::http::error::{ApiError, ApiResult};
use crate::http::extractors::ValidJson;
use crate::http::response::Envelope;
use crate::services::owners::resolve_active_owner;
use crate::state::AppState;

/// `ownerId: null` switches back to the personal owner.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveOwnerRequest {
    pub owner_id: Option<Uuid>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveOwnerResponse {
    pub active_owner: OwnerSummary,
    pub token: String,
}

/// POST /session/active-owner
///
/// The claim is only ever changed by re-issuing the token here.
async fn set_active_owner(
    State(state): State<Arc<AppState>>,
    session: Session,
    jar: CookieJar,
    ValidJson(req): ValidJson<ActiveOwnerRequest>,
) -> ApiResult<(CookieJar, Envelope<ActiveOwnerResponse>)> {
    let user_id = session.user_id();
    let owner = resolve_active_owner(state.store.as_ref(), user_id, req.owner_id).await?;
    let active_owner = state
        .store
        .owner_summary(owner.id)
        .await?
        .ok_or_else(|| ApiError::not_found("owner", owner.id))?;

    let token = state.sessions.issue(user_id, Some(owner.id))?;
    tracing::info!(%user_id, owner_id = %owner.id, "active owner switched");

    Ok((
        jar.add(state.sessions.cookie(token.clone())),
        Envelope::ok(ActiveOwnerResponse { active_owner, token }),
    ))
}

/// Session routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/session/active-owner", post(set_active_owner))
}
