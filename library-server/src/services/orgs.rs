//! Organizations and their memberships

use uuid::Uuid;

use library_core::models::{NewOrg, Org, OrgMember, OrgRole, Owner};

use crate::db::Store;
use crate::http::error::{ApiError, ApiResult};

/// Create an org, its owner identity, and the creator's `owner` membership.
pub async fn create_org(store: &dyn Store, creator: Uuid, new: NewOrg) -> ApiResult<(Org, Owner)> {
    let (org, owner) = store.create_org(new, creator).await?;
    tracing::info!(org_id = %org.id, slug = %org.slug, %creator, "org created");
    Ok((org, owner))
}

pub async fn get_org(store: &dyn Store, org_id: Uuid) -> ApiResult<Org> {
    store
        .get_org(org_id)
        .await?
        .ok_or_else(|| ApiError::not_found("org", org_id))
}

pub async fn members(store: &dyn Store, org_id: Uuid) -> ApiResult<Vec<OrgMember>> {
    get_org(store, org_id).await?;
    Ok(store.list_members(org_id).await?)
}

/// Add `target` to the org or change their role.
///
/// Callers need `owner` or `admin`; only an `owner` may grant or revoke
/// `owner`, and the last owner cannot be demoted.
pub async fn set_member_role(
    store: &dyn Store,
    caller: Uuid,
    org_id: Uuid,
    target: Uuid,
    role: OrgRole,
) -> ApiResult<OrgMember> {
    get_org(store, org_id).await?;

    let caller_role = store
        .membership_role(org_id, caller)
        .await?
        .ok_or_else(|| ApiError::forbidden("not a member of this organization"))?;
    if !caller_role.can_manage_members() {
        return Err(ApiError::forbidden("members cannot manage roles"));
    }
    if !caller_role.can_grant(role) {
        return Err(ApiError::forbidden("only owners can grant the owner role"));
    }

    if store.get_user(target).await?.is_none() {
        return Err(ApiError::not_found("user", target));
    }

    let current = store.membership_role(org_id, target).await?;
    if current == Some(OrgRole::Owner) && role != OrgRole::Owner && caller_role != OrgRole::Owner {
        return Err(ApiError::forbidden("only owners can change an owner's role"));
    }

    // the store refuses to demote the last owner
    let member = store.set_member_role(org_id, target, role).await?;
    tracing::info!(%org_id, user_id = %target, role = role.as_str(), by = %caller, "member role set");
    Ok(member)
}
