//! Signed session tokens and the cookie that carries them

use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use library_core::config::SessionSection;

use super::AuthError;

/// Token payload. `activeOwnerId` is absent until the user switches owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionClaims {
    pub sub: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_owner_id: Option<Uuid>,
    pub iat: i64,
    pub exp: i64,
}

/// Keys and cookie settings for issuing and verifying sessions.
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: i64,
    cookie_name: String,
    secure: bool,
}

impl SessionKeys {
    pub fn new(settings: &SessionSection) -> Self {
        let secret = settings.secret.as_bytes();
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl_secs: i64::try_from(settings.ttl_secs).unwrap_or(i64::MAX),
            cookie_name: settings.cookie_name.clone(),
            secure: settings.secure_cookie,
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    pub fn issue(&self, user_id: Uuid, active_owner_id: Option<Uuid>) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        self.encode(&SessionClaims {
            sub: user_id,
            active_owner_id,
            iat: now,
            exp: now.saturating_add(self.ttl_secs),
        })
    }

    pub fn encode(&self, claims: &SessionClaims) -> Result<String, AuthError> {
        encode(&Header::default(), claims, &self.encoding).map_err(|e| AuthError::Token(e.to_string()))
    }

    /// Checks signature and expiry.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, AuthError> {
        let data = decode::<SessionClaims>(token, &self.decoding, &Validation::default())
            .map_err(AuthError::InvalidToken)?;
        Ok(data.claims)
    }

    pub fn cookie(&self, token: String) -> Cookie<'static> {
        Cookie::build((self.cookie_name.clone(), token))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .build()
    }

    /// Cookie used to clear the session on logout.
    pub fn removal_cookie(&self) -> Cookie<'static> {
        Cookie::build((self.cookie_name.clone(), "")).path("/").build()
    }
}
