//! Organization endpoints

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use library_core::models::{NewOrg, Org, OrgMember, OrgRole};

use crate::auth::Session;
use crate::http::error::ApiResult;
use crate::http::extractors::{ValidJson, ValidUuid};
use crate::http::response::Envelope;
use crate::services::orgs;
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrgRequest {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrgResponse {
    #[serde(flatten)]
    pub org: Org,
    pub owner_id: Uuid,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetMemberRequest {
    pub user_id: Uuid,
    pub role: String,
}

/// POST /orgs
async fn create_org(
    State(state): State<Arc<AppState>>,
    session: Session,
    ValidJson(req): ValidJson<CreateOrgRequest>,
) -> ApiResult<(StatusCode, Envelope<CreateOrgResponse>)> {
    let new = NewOrg::new(&req.name, &req.slug, req.description.as_deref())?;
    let (org, owner) = orgs::create_org(state.store.as_ref(), session.user_id(), new).await?;
    Ok(Envelope::created(CreateOrgResponse {
        org,
        owner_id: owner.id,
    }))
}

/// GET /orgs/{id}
async fn get_org(State(state): State<Arc<AppState>>, ValidUuid(id): ValidUuid) -> ApiResult<Envelope<Org>> {
    Ok(Envelope::ok(orgs::get_org(state.store.as_ref(), id).await?))
}

/// GET /orgs/{id}/members
async fn list_members(
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
) -> ApiResult<Envelope<Vec<OrgMember>>> {
    Ok(Envelope::ok(orgs::members(state.store.as_ref(), id).await?))
}

/// PUT /orgs/{id}/members
async fn set_member(
    State(state): State<Arc<AppState>>,
    session: Session,
    ValidUuid(id): ValidUuid,
    ValidJson(req): ValidJson<SetMemberRequest>,
) -> ApiResult<Envelope<OrgMember>> {
    let role = OrgRole::parse(&req.role)?;
    let member = orgs::set_member_role(state.store.as_ref(), session.user_id(), id, req.user_id, role).await?;
    Ok(Envelope::ok(member))
}

/// Organization routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/orgs", post(create_org))
        .route("/orgs/{id}", get(get_org))
        .route("/orgs/{id}/members", get(list_members).put(set_member))
}
