//! Session extractors

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header, HeaderMap};
use axum_extra::extract::cookie::CookieJar;
use uuid::Uuid;

use library_core::models::Owner;

use super::{AuthError, SessionClaims};
use crate::http::error::ApiError;
use crate::services::owners::resolve_active_owner;
use crate::state::AppState;

/// Bearer token from the Authorization header, if any.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

/// Verified session claims. Rejects with 401.
#[derive(Debug, Clone)]
pub struct Session(pub SessionClaims);

impl Session {
    pub fn user_id(&self) -> Uuid {
        self.0.sub
    }
}

impl FromRequestParts<Arc<AppState>> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let token = match bearer_token(&parts.headers) {
            Some(token) => token.to_owned(),
            None => CookieJar::from_headers(&parts.headers)
                .get(state.sessions.cookie_name())
                .map(|cookie| cookie.value().to_owned())
                .ok_or(AuthError::MissingSession)?,
        };

        let claims = state.sessions.verify(&token)?;
        Ok(Self(claims))
    }
}

/// The caller plus the owner they are currently acting as.
///
/// Resolution runs on every request, so a revoked org role takes effect
/// without waiting for the token to expire.
#[derive(Debug, Clone)]
pub struct Actor {
    pub user_id: Uuid,
    pub owner: Owner,
}

impl FromRequestParts<Arc<AppState>> for Actor {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let Session(claims) = Session::from_request_parts(parts, state).await?;
        let owner = resolve_active_owner(state.store.as_ref(), claims.sub, claims.active_owner_id).await?;

        tracing::debug!(user_id = %claims.sub, owner_id = %owner.id, "actor resolved");
        Ok(Self {
            user_id: claims.sub,
            owner,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_prefix_is_required() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(bearer_token(&headers), Some("abc"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);
    }
}
