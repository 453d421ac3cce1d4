//! Registration, login and logout

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::post, Router};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use library_core::models::User;

use crate::http::error::ApiResult;
use crate::http::extractors::ValidJson;
use crate::http::response::Envelope;
use crate::services::{accounts, owners};
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Issued session. The token is also set as the session cookie.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub user: User,
    pub personal_owner_id: Uuid,
    pub token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutResponse {
    pub logged_out: bool,
}

/// POST /auth/register
async fn register(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    ValidJson(req): ValidJson<RegisterRequest>,
) -> ApiResult<(StatusCode, CookieJar, Envelope<SessionResponse>)> {
    let (user, owner) = accounts::register(state.store.as_ref(), &req.email, &req.password, &req.name).await?;
    let token = state.sessions.issue(user.id, None)?;

    Ok((
        StatusCode::CREATED,
        jar.add(state.sessions.cookie(token.clone())),
        Envelope::ok(SessionResponse {
            user,
            personal_owner_id: owner.id,
            token,
        }),
    ))
}

/// POST /auth/login
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    ValidJson(req): ValidJson<LoginRequest>,
) -> ApiResult<(CookieJar, Envelope<SessionResponse>)> {
    let user = accounts::login(state.store.as_ref(), &req.email, &req.password).await?;
    let personal = owners::resolve_active_owner(state.store.as_ref(), user.id, None).await?;
    let token = state.sessions.issue(user.id, None)?;
    tracing::info!(user_id = %user.id, "login");

    Ok((
        jar.add(state.sessions.cookie(token.clone())),
        Envelope::ok(SessionResponse {
            user,
            personal_owner_id: personal.id,
            token,
        }),
    ))
}

/// POST /auth/logout
async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, Envelope<LogoutResponse>) {
    (
        jar.remove(state.sessions.removal_cookie()),
        Envelope::ok(LogoutResponse { logged_out: true }),
    )
}

/// Auth routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
}
