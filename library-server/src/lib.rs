//! library-server: HTTP service for Project Library
//!
//! Owners (users and orgs) follow each other, exchange messages, and
//! manage images and a topic taxonomy. A signed session carries the
//! caller and the owner they currently act as.

pub mod auth;
pub mod db;
pub mod http;
pub mod ratelimit;
pub mod services;
pub mod state;

pub use db::{create_pool, DbError, MemoryStore, PgStore, Store};
pub use http::{build_router, run_server, ApiError, ServerConfig};
pub use ratelimit::{FixedWindowLimiter, RateLimiter};
pub use state::AppState;
