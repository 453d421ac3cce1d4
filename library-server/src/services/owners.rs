//! Owner resolution: which identity a user may act as

use serde::Serialize;
use uuid::Uuid;

use library_core::models::{OrgRole, Owner, OwnerBacking, OwnerSummary};

use crate::db::repos::owners::summarize;
use crate::db::Store;
use crate::http::error::{ApiError, ApiResult};

/// An owner the user may switch to, with the role that grants it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActableOwner {
    #[serde(flatten)]
    pub owner: OwnerSummary,
    /// `None` for the personal owner
    pub role: Option<OrgRole>,
}

/// Resolve the owner a user acts as.
///
/// - nothing requested: the user's personal owner
/// - the personal owner, or an org owner where the user is owner/admin: allowed
/// - an unknown owner id: `NotFound`
/// - anything else: `Forbidden`
pub async fn resolve_active_owner(
    store: &dyn Store,
    user_id: Uuid,
    requested: Option<Uuid>,
) -> ApiResult<Owner> {
    let personal = store
        .personal_owner(user_id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("session user no longer exists"))?;

    let Some(requested) = requested else {
        return Ok(personal);
    };
    if requested == personal.id {
        return Ok(personal);
    }

    let owner = store
        .get_owner(requested)
        .await?
        .ok_or_else(|| ApiError::not_found("owner", requested))?;

    match owner.backing {
        OwnerBacking::Org(org_id) => {
            let role = store.membership_role(org_id, user_id).await?;
            if role.is_some_and(|r| r.can_act_as_org()) {
                Ok(owner)
            } else {
                tracing::debug!(%user_id, owner_id = %requested, ?role, "owner switch denied");
                Err(ApiError::forbidden("not allowed to act as this organization"))
            }
        }
        OwnerBacking::User(_) => Err(ApiError::forbidden("cannot act as another user")),
    }
}

/// Personal owner first, then every org the user may act as (by org name).
pub async fn actable_owners(store: &dyn Store, user_id: Uuid) -> ApiResult<Vec<ActableOwner>> {
    let personal = store
        .personal_owner(user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("owner", user_id))?;
    let personal = store
        .owner_summary(personal.id)
        .await?
        .ok_or_else(|| ApiError::not_found("owner", personal.id))?;

    let mut out = vec![ActableOwner {
        owner: personal,
        role: None,
    }];
    for membership in store.memberships(user_id).await? {
        if membership.role.can_act_as_org() {
            out.push(ActableOwner {
                owner: summarize(&membership.owner, membership.org.name),
                role: Some(membership.role),
            });
        }
    }
    Ok(out)
}
