//! Follow management

use uuid::Uuid;

use library_core::models::{Follow, FollowEdge, Owner, Page, PageRequest};

use crate::db::Store;
use crate::http::error::{ApiError, ApiResult};

/// `actor` starts following `target`.
///
/// Duplicates are left to the unique constraint and surface as `Conflict`.
pub async fn follow(store: &dyn Store, actor: &Owner, target: Uuid) -> ApiResult<Follow> {
    if actor.id == target {
        return Err(ApiError::bad_request("cannot follow yourself"));
    }
    ensure_owner(store, target).await?;

    let follow = store.create_follow(actor.id, target).await?;
    tracing::info!(follower = %actor.id, following = %target, "follow created");
    Ok(follow)
}

pub async fn followers(store: &dyn Store, owner_id: Uuid, page: PageRequest) -> ApiResult<Page<FollowEdge>> {
    ensure_owner(store, owner_id).await?;
    Ok(store.list_followers(owner_id, page).await?)
}

pub async fn following(store: &dyn Store, owner_id: Uuid, page: PageRequest) -> ApiResult<Page<FollowEdge>> {
    ensure_owner(store, owner_id).await?;
    Ok(store.list_following(owner_id, page).await?)
}

async fn ensure_owner(store: &dyn Store, owner_id: Uuid) -> ApiResult<()> {
    match store.get_owner(owner_id).await? {
        Some(_) => Ok(()),
        None => Err(ApiError::not_found("owner", owner_id)),
    }
}
