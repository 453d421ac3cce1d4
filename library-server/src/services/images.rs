//! Images owned by an owner

use uuid::Uuid;

use library_core::models::{Image, NewImage, Owner, Page, PageRequest};

use crate::db::Store;
use crate::http::error::{ApiError, ApiResult};

pub async fn add_image(store: &dyn Store, owner: &Owner, url: &str, caption: Option<&str>) -> ApiResult<Image> {
    let new = NewImage::new(owner.id, url, caption)?;
    let image = store.create_image(new).await?;
    tracing::info!(image_id = %image.id, owner_id = %owner.id, "image added");
    Ok(image)
}

pub async fn list_images(store: &dyn Store, owner_id: Uuid, page: PageRequest) -> ApiResult<Page<Image>> {
    if store.get_owner(owner_id).await?.is_none() {
        return Err(ApiError::not_found("owner", owner_id));
    }
    Ok(store.list_images(owner_id, page).await?)
}

/// Only the owning owner may delete.
pub async fn delete_image(store: &dyn Store, owner: &Owner, image_id: Uuid) -> ApiResult<()> {
    let image = store
        .get_image(image_id)
        .await?
        .ok_or_else(|| ApiError::not_found("image", image_id))?;
    if image.owner_id != owner.id {
        return Err(ApiError::forbidden("image belongs to another owner"));
    }

    if !store.delete_image(image_id).await? {
        return Err(ApiError::not_found("image", image_id));
    }
    tracing::info!(%image_id, owner_id = %owner.id, "image deleted");
    Ok(())
}
