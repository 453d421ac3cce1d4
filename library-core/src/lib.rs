//! library-core: domain types and configuration for Project Library
//!
//! Everything here is storage- and transport-agnostic. The server crate
//! maps these types to rows and JSON.

pub mod config;
pub mod models;

pub use config::LibraryConfig;
pub use models::ValidationError;
