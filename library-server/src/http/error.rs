//! API error types with IntoResponse
//!
//! Errors are converted to enveloped JSON responses with appropriate
//! status codes. Database and internal details are logged, never returned.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use library_core::models::ValidationError;

use super::response::Envelope;
use crate::auth::AuthError;
use crate::db::DbError;

pub type ApiResult<T> = Result<T, ApiError>;

/// API error type with automatic HTTP status mapping
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Validation failed (400)
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Request is well-formed but not acceptable (400)
    #[error("{message}")]
    BadRequest { message: String },

    /// Missing or invalid session (401)
    #[error("{message}")]
    Unauthorized { message: String },

    /// Authenticated but not permitted (403)
    #[error("{reason}")]
    Forbidden { reason: String },

    /// Resource not found (404)
    #[error("{resource} '{id}' not found")]
    NotFound { resource: &'static str, id: String },

    /// Unique constraint hit (409)
    #[error("{message}")]
    Conflict { message: String },

    /// Request ran past the server's time limit (408)
    #[error("request timed out")]
    Timeout,

    /// Client exceeded its request window (429)
    #[error("rate limit exceeded, retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// Database error (500, logged)
    #[error("database error: {0}")]
    Database(DbError),

    /// Internal error (500, logged)
    #[error("{message}")]
    Internal { message: String },
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden {
            reason: reason.into(),
        }
    }

    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::Timeout => StatusCode::REQUEST_TIMEOUT,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Database(_) | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) | Self::BadRequest { .. } => "bad_request",
            Self::Unauthorized { .. } => "unauthorized",
            Self::Forbidden { .. } => "forbidden",
            Self::NotFound { .. } => "not_found",
            Self::Conflict { .. } => "conflict",
            Self::Timeout => "request_timeout",
            Self::RateLimited { .. } => "rate_limited",
            Self::Database(_) | Self::Internal { .. } => "internal_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            Self::Database(e) => {
                // Log the actual error, return generic message
                tracing::error!(error = %e, "database error");
                "an internal error occurred".to_string()
            }
            Self::Internal { message } => {
                tracing::error!(%message, "internal error");
                "an internal error occurred".to_string()
            }
            other => other.to_string(),
        };

        let mut response = (self.status(), Envelope::error(self.code(), message)).into_response();
        if let Self::RateLimited { retry_after_secs } = self {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
        }
        response
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound { resource, id } => Self::NotFound { resource, id },
            DbError::Conflict { resource, detail } => Self::Conflict {
                message: format!("{resource}: {detail}"),
            },
            DbError::LastOwner { .. } => Self::bad_request("an organization needs at least one owner"),
            _ => Self::Database(e),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::MissingSession | AuthError::InvalidToken(_) => {
                Self::unauthorized("missing or invalid session")
            }
            AuthError::InvalidCredentials => Self::unauthorized("invalid email or password"),
            AuthError::Hash(message) | AuthError::Token(message) => Self::Internal { message },
        }
    }
}
