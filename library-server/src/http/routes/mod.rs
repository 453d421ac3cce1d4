//! Route handlers organized by resource

pub mod auth;
pub mod follows;
pub mod health;
pub mod images;
pub mod me;
pub mod messages;
pub mod orgs;
pub mod owners;
pub mod session;
pub mod topics;
