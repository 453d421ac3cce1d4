//! Session authentication
//!
//! - Passwords: argon2 PHC strings
//! - Sessions: HS256 JWTs in an HttpOnly cookie or `Authorization: Bearer`
//! - Extractors: [`Session`] (who is calling) and [`Actor`] (as which owner)

pub mod extract;
pub mod password;
pub mod session;

pub use extract::{Actor, Session};
pub use password::{hash_password, verify_password};
pub use session::{SessionClaims, SessionKeys};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("no session token")]
    MissingSession,

    #[error("invalid session token: {0}")]
    InvalidToken(#[source] jsonwebtoken::errors::Error),

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error("token encoding failed: {0}")]
    Token(String),
}
