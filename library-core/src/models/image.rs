//! Images attached to an owner

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::validation::{bounded, ValidationError};

const MAX_URL_LEN: usize = 2048;
const MAX_CAPTION_LEN: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub url: String,
    pub caption: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewImage {
    pub owner_id: Uuid,
    pub url: String,
    pub caption: Option<String>,
}

impl NewImage {
    pub fn new(owner_id: Uuid, url: &str, caption: Option<&str>) -> Result<Self, ValidationError> {
        let url = bounded("url", url, MAX_URL_LEN)?;
        let has_host = url
            .strip_prefix("https://")
            .or_else(|| url.strip_prefix("http://"))
            .is_some_and(|rest| !rest.is_empty() && !rest.starts_with('/'));
        if !has_host || url.chars().any(char::is_whitespace) {
            return Err(ValidationError::InvalidFormat {
                field: "url",
                reason: "expected an http(s) URL",
            });
        }

        let caption = caption
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(|c| bounded("caption", c, MAX_CAPTION_LEN))
            .transpose()?;

        Ok(Self {
            owner_id,
            url,
            caption,
        })
    }
}
