//! HTTP server layer
//!
//! Axum server with:
//! - CORS (localhost only by default)
//! - Request tracing and timeouts
//! - Rate limiting
//! - Graceful shutdown
//! - Enveloped JSON responses

pub mod error;
pub mod extractors;
pub mod response;
pub mod routes;
pub mod server;

pub use error::{ApiError, ApiResult};
pub use response::Envelope;
pub use server::{build_router, run_server, ServerConfig, ServerError};
