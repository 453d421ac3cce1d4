//! The signed-in user's own profile

use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, put},
    Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use library_core::models::{OwnerSummary, ProfileUpdate, User};

use crate::auth::Session;
use crate::http::error::{ApiError, ApiResult};
use crate::http::extractors::ValidJson;
use crate::http::response::Envelope;
use crate::services::owners::{actable_owners, resolve_active_owner, ActableOwner};
use crate::services::accounts;
use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub user: User,
    pub personal_owner_id: Uuid,
    pub active_owner: OwnerSummary,
    /// Owner the session still names but the user may no longer act as.
    /// `activeOwner` falls back to the personal owner while this is set.
    pub stale_active_owner_id: Option<Uuid>,
    /// Owners the user may switch to
    pub owners: Vec<ActableOwner>,
}

/// Absent fields are left alone; `bio: ""` clears the bio.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub interests: Option<Vec<String>>,
}

/// GET /me
///
/// Works with a stale active owner so the user can still see who they are
/// and switch back.
async fn me(State(state): State<Arc<AppState>>, session: Session) -> ApiResult<Envelope<MeResponse>> {
    let store = state.store.as_ref();
    let user_id = session.user_id();
    let user = accounts::get_user(store, user_id).await?;
    let owners = actable_owners(store, user_id).await?;

    let personal_owner_id = owners
        .first()
        .map(|o| o.owner.id)
        .ok_or_else(|| ApiError::not_found("owner", user_id))?;

    let requested = session.0.active_owner_id;
    let (active_owner_id, stale_active_owner_id) = match resolve_active_owner(store, user_id, requested).await {
        Ok(owner) => (owner.id, None),
        Err(ApiError::Forbidden { .. } | ApiError::NotFound { .. }) => {
            tracing::debug!(%user_id, stale = ?requested, "session names an owner the user cannot act as");
            (personal_owner_id, requested)
        }
        Err(e) => return Err(e),
    };
    let active_owner = store
        .owner_summary(active_owner_id)
        .await?
        .ok_or_else(|| ApiError::not_found("owner", active_owner_id))?;

    Ok(Envelope::ok(MeResponse {
        user,
        personal_owner_id,
        active_owner,
        stale_active_owner_id,
        owners,
    }))
}

/// PUT /me/user
async fn update_user(
    State(state): State<Arc<AppState>>,
    session: Session,
    ValidJson(req): ValidJson<UpdateUserRequest>,
) -> ApiResult<Envelope<User>> {
    let update = ProfileUpdate::new(req.name.as_deref(), req.bio.as_deref(), req.interests.as_deref())?;
    let user = accounts::update_profile(state.store.as_ref(), session.user_id(), update).await?;
    Ok(Envelope::ok(user))
}

/// Profile routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/me", get(me))
        .route("/me/user", put(update_user))
}
