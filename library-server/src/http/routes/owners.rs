//! Public owner profiles and their follow graph

use std::sync::Arc;

use axum::{extract::State, routing::get, Router};

use library_core::models::{FollowEdge, Image, OwnerProfile, Page, PageParams};

use crate::http::error::{ApiError, ApiResult};
use crate::http::extractors::{ValidQuery, ValidUuid};
use crate::http::response::Envelope;
use crate::services::{follows, images};
use crate::state::AppState;

/// GET /owners/{id}
async fn get_owner(State(state): State<Arc<AppState>>, ValidUuid(id): ValidUuid) -> ApiResult<Envelope<OwnerProfile>> {
    let profile = state
        .store
        .owner_profile(id)
        .await?
        .ok_or_else(|| ApiError::not_found("owner", id))?;
    Ok(Envelope::ok(profile))
}

/// GET /owners/{id}/followers
async fn followers(
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
    ValidQuery(params): ValidQuery<PageParams>,
) -> ApiResult<Envelope<Page<FollowEdge>>> {
    let page = follows::followers(state.store.as_ref(), id, params.into()).await?;
    Ok(Envelope::ok(page))
}

/// GET /owners/{id}/following
async fn following(
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
    ValidQuery(params): ValidQuery<PageParams>,
) -> ApiResult<Envelope<Page<FollowEdge>>> {
    let page = follows::following(state.store.as_ref(), id, params.into()).await?;
    Ok(Envelope::ok(page))
}

/// GET /owners/{id}/images
async fn owner_images(
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
    ValidQuery(params): ValidQuery<PageParams>,
) -> ApiResult<Envelope<Page<Image>>> {
    let page = images::list_images(state.store.as_ref(), id, params.into()).await?;
    Ok(Envelope::ok(page))
}

/// Owner routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/owners/{id}", get(get_owner))
        .route("/owners/{id}/followers", get(followers))
        .route("/owners/{id}/following", get(following))
        .route("/owners/{id}/images", get(owner_images))
}
