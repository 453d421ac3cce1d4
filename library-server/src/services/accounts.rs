//! Registration, login and profile updates

use uuid::Uuid;

use library_core::models::{validate_name, Email, NewUser, Owner, Password, ProfileUpdate, User};

use crate::auth::{hash_password, verify_password, AuthError};
use crate::db::Store;
use crate::http::error::{ApiError, ApiResult};

/// Create a user and their personal owner.
pub async fn register(store: &dyn Store, email: &str, password: &str, name: &str) -> ApiResult<(User, Owner)> {
    let email = Email::new(email)?;
    let password = Password::new(password)?;
    let name = validate_name(name)?;

    // argon2 is CPU-bound
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| ApiError::Internal { message: e.to_string() })??;

    let (user, owner) = store
        .create_user(NewUser {
            email,
            name,
            password_hash,
        })
        .await?;

    tracing::info!(user_id = %user.id, owner_id = %owner.id, "user registered");
    Ok((user, owner))
}

/// Check credentials. Every failure is the same `Unauthorized`.
pub async fn login(store: &dyn Store, email: &str, password: &str) -> ApiResult<User> {
    let email = Email::new(email).map_err(|_| AuthError::InvalidCredentials)?;
    let credentials = store
        .user_credentials(&email)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    let password = password.to_owned();
    let hash = credentials.password_hash;
    let valid = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| ApiError::Internal { message: e.to_string() })??;

    if !valid {
        tracing::debug!(user_id = %credentials.user.id, "login rejected");
        return Err(AuthError::InvalidCredentials.into());
    }
    Ok(credentials.user)
}

pub async fn get_user(store: &dyn Store, user_id: Uuid) -> ApiResult<User> {
    store
        .get_user(user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("user", user_id))
}

pub async fn update_profile(store: &dyn Store, user_id: Uuid, update: ProfileUpdate) -> ApiResult<User> {
    if update.is_empty() {
        return get_user(store, user_id).await;
    }
    Ok(store.update_user(user_id, &update).await?)
}
