//! Image endpoints

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, post},
    Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use library_core::models::Image;

use crate::auth::Actor;
use crate::http::error::ApiResult;
use crate::http::extractors::{ValidJson, ValidUuid};
use crate::http::response::Envelope;
use crate::services::images;
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddImageRequest {
    pub url: String,
    pub caption: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedImage {
    pub id: Uuid,
    pub deleted: bool,
}

/// POST /images - owned by the active owner
async fn add_image(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    ValidJson(req): ValidJson<AddImageRequest>,
) -> ApiResult<(StatusCode, Envelope<Image>)> {
    let image = images::add_image(state.store.as_ref(), &actor.owner, &req.url, req.caption.as_deref()).await?;
    Ok(Envelope::created(image))
}

/// DELETE /images/{id}
async fn delete_image(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    ValidUuid(id): ValidUuid,
) -> ApiResult<Envelope<DeletedImage>> {
    images::delete_image(state.store.as_ref(), &actor.owner, id).await?;
    Ok(Envelope::ok(DeletedImage { id, deleted: true }))
}

/// Image routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/images", post(add_image))
        .route("/images/{id}", delete(delete_image))
}
