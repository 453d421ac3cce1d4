//! Database layer - store trait, Postgres repositories, in-memory store
//!
//! # Design Principles
//!
//! - Handlers and services only see [`Store`]; Postgres and memory back it
//! - List operations use JOINs for display names (no N+1)
//! - Rely on DB constraints and map violations (no check-then-insert)
//! - Transactions for rows that must appear together (user + owner)

pub mod memory;
pub mod migrations;
pub mod pg_store;
pub mod pool;
pub mod repos;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use library_core::models::{
    Email, Follow, FollowEdge, Image, Message, MessageFilter, NewImage, NewMessage, NewOrg,
    NewTopic, NewUser, Org, OrgMember, OrgRole, Owner, OwnerProfile, OwnerSummary, Page,
    PageRequest, ProfileUpdate, Topic, User, UserCredentials, ValidationError,
};

pub use memory::MemoryStore;
pub use pg_store::PgStore;
pub use pool::{create_pool, create_pool_with_options};

/// Storage error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("not found: {resource} '{id}'")]
    NotFound { resource: &'static str, id: String },

    #[error("conflict: {resource} {detail}")]
    Conflict {
        resource: &'static str,
        detail: String,
    },

    /// The change would leave an org without an owner.
    #[error("org '{org_id}' must keep at least one owner")]
    LastOwner { org_id: Uuid },

    #[error("invalid stored data: {0}")]
    Corrupt(#[from] ValidationError),
}

impl DbError {
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }
}

/// An org the user belongs to, with the org's owner identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Membership {
    pub org: Org,
    pub owner: Owner,
    pub role: OrgRole,
}

/// Persistence boundary for every resource.
///
/// Paged listings report `total` as the number of matching rows whatever
/// page was asked for; a page past the end has no items and the full total.
#[async_trait]
pub trait Store: Send + Sync + 'static {
    // Users

    /// Insert a user and its personal owner together.
    async fn create_user(&self, new: NewUser) -> Result<(User, Owner), DbError>;
    async fn user_credentials(&self, email: &Email) -> Result<Option<UserCredentials>, DbError>;
    async fn get_user(&self, id: Uuid) -> Result<Option<User>, DbError>;
    async fn update_user(&self, id: Uuid, update: &ProfileUpdate) -> Result<User, DbError>;

    // Owners

    async fn get_owner(&self, id: Uuid) -> Result<Option<Owner>, DbError>;
    async fn personal_owner(&self, user_id: Uuid) -> Result<Option<Owner>, DbError>;
    async fn owner_summary(&self, id: Uuid) -> Result<Option<OwnerSummary>, DbError>;
    async fn owner_profile(&self, id: Uuid) -> Result<Option<OwnerProfile>, DbError>;

    // Orgs

    /// Insert org, org owner and the creator's `owner` membership together.
    async fn create_org(&self, new: NewOrg, creator: Uuid) -> Result<(Org, Owner), DbError>;
    async fn get_org(&self, id: Uuid) -> Result<Option<Org>, DbError>;
    async fn membership_role(&self, org_id: Uuid, user_id: Uuid) -> Result<Option<OrgRole>, DbError>;
    async fn list_members(&self, org_id: Uuid) -> Result<Vec<OrgMember>, DbError>;
    /// Add a member or change their role.
    ///
    /// Fails with `LastOwner` when it would demote the org's only owner. The
    /// check and the write are atomic, so concurrent demotions cannot both
    /// pass it.
    async fn set_member_role(&self, org_id: Uuid, user_id: Uuid, role: OrgRole) -> Result<OrgMember, DbError>;
    async fn memberships(&self, user_id: Uuid) -> Result<Vec<Membership>, DbError>;

    // Follows

    /// Fails with `Conflict` when the ordered pair already exists.
    async fn create_follow(&self, follower: Uuid, following: Uuid) -> Result<Follow, DbError>;
    async fn list_followers(&self, owner_id: Uuid, page: PageRequest) -> Result<Page<FollowEdge>, DbError>;
    async fn list_following(&self, owner_id: Uuid, page: PageRequest) -> Result<Page<FollowEdge>, DbError>;

    // Messages

    async fn create_message(&self, new: NewMessage) -> Result<Message, DbError>;
    async fn get_message(&self, id: Uuid) -> Result<Option<Message>, DbError>;
    /// `read_at = read_at ?? at`
    async fn mark_message_read(&self, id: Uuid, at: DateTime<Utc>) -> Result<Message, DbError>;
    async fn inbox(&self, owner_id: Uuid, filter: MessageFilter, page: PageRequest) -> Result<Page<Message>, DbError>;
    async fn sent(&self, owner_id: Uuid, filter: MessageFilter, page: PageRequest) -> Result<Page<Message>, DbError>;

    // Images

    async fn create_image(&self, new: NewImage) -> Result<Image, DbError>;
    async fn get_image(&self, id: Uuid) -> Result<Option<Image>, DbError>;
    async fn list_images(&self, owner_id: Uuid, page: PageRequest) -> Result<Page<Image>, DbError>;
    /// Returns false when nothing was deleted.
    async fn delete_image(&self, id: Uuid) -> Result<bool, DbError>;

    // Topics

    async fn create_topic(&self, new: NewTopic) -> Result<Topic, DbError>;
    async fn get_topic(&self, id: Uuid) -> Result<Option<Topic>, DbError>;
    async fn list_topics(&self) -> Result<Vec<Topic>, DbError>;
}
