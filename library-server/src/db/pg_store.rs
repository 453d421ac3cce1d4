//! Postgres-backed [`Store`]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use library_core::models::{
    Email, Follow, FollowEdge, Image, Message, MessageFilter, NewImage, NewMessage, NewOrg,
    NewTopic, NewUser, Org, OrgMember, OrgRole, Owner, OwnerProfile, OwnerSummary, Page,
    PageRequest, ProfileUpdate, Topic, User, UserCredentials,
};

use super::repos::{FollowRepo, ImageRepo, MessageRepo, OrgRepo, OwnerRepo, TopicRepo, UserRepo};
use super::{DbError, Membership, Store};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn create_user(&self, new: NewUser) -> Result<(User, Owner), DbError> {
        UserRepo::new(&self.pool).create(new).await
    }

    async fn user_credentials(&self, email: &Email) -> Result<Option<UserCredentials>, DbError> {
        UserRepo::new(&self.pool).credentials(email).await
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, DbError> {
        UserRepo::new(&self.pool).get(id).await
    }

    async fn update_user(&self, id: Uuid, update: &ProfileUpdate) -> Result<User, DbError> {
        UserRepo::new(&self.pool).update(id, update).await
    }

    async fn get_owner(&self, id: Uuid) -> Result<Option<Owner>, DbError> {
        OwnerRepo::new(&self.pool).get(id).await
    }

    async fn personal_owner(&self, user_id: Uuid) -> Result<Option<Owner>, DbError> {
        OwnerRepo::new(&self.pool).for_user(user_id).await
    }

    async fn owner_summary(&self, id: Uuid) -> Result<Option<OwnerSummary>, DbError> {
        OwnerRepo::new(&self.pool).summary(id).await
    }

    async fn owner_profile(&self, id: Uuid) -> Result<Option<OwnerProfile>, DbError> {
        OwnerRepo::new(&self.pool).profile(id).await
    }

    async fn create_org(&self, new: NewOrg, creator: Uuid) -> Result<(Org, Owner), DbError> {
        OrgRepo::new(&self.pool).create(new, creator).await
    }

    async fn get_org(&self, id: Uuid) -> Result<Option<Org>, DbError> {
        OrgRepo::new(&self.pool).get(id).await
    }

    async fn membership_role(&self, org_id: Uuid, user_id: Uuid) -> Result<Option<OrgRole>, DbError> {
        OrgRepo::new(&self.pool).role(org_id, user_id).await
    }

    async fn list_members(&self, org_id: Uuid) -> Result<Vec<OrgMember>, DbError> {
        OrgRepo::new(&self.pool).members(org_id).await
    }

    async fn set_member_role(&self, org_id: Uuid, user_id: Uuid, role: OrgRole) -> Result<OrgMember, DbError> {
        OrgRepo::new(&self.pool).set_role(org_id, user_id, role).await
    }

    async fn memberships(&self, user_id: Uuid) -> Result<Vec<Membership>, DbError> {
        OrgRepo::new(&self.pool).memberships(user_id).await
    }

    async fn create_follow(&self, follower: Uuid, following: Uuid) -> Result<Follow, DbError> {
        FollowRepo::new(&self.pool).create(follower, following).await
    }

    async fn list_followers(&self, owner_id: Uuid, page: PageRequest) -> Result<Page<FollowEdge>, DbError> {
        FollowRepo::new(&self.pool).followers(owner_id, page).await
    }

    async fn list_following(&self, owner_id: Uuid, page: PageRequest) -> Result<Page<FollowEdge>, DbError> {
        FollowRepo::new(&self.pool).following(owner_id, page).await
    }

    async fn create_message(&self, new: NewMessage) -> Result<Message, DbError> {
        MessageRepo::new(&self.pool).create(new).await
    }

    async fn get_message(&self, id: Uuid) -> Result<Option<Message>, DbError> {
        MessageRepo::new(&self.pool).get(id).await
    }

    async fn mark_message_read(&self, id: Uuid, at: DateTime<Utc>) -> Result<Message, DbError> {
        MessageRepo::new(&self.pool).mark_read(id, at).await
    }

    async fn inbox(&self, owner_id: Uuid, filter: MessageFilter, page: PageRequest) -> Result<Page<Message>, DbError> {
        MessageRepo::new(&self.pool).inbox(owner_id, filter, page).await
    }

    async fn sent(&self, owner_id: Uuid, filter: MessageFilter, page: PageRequest) -> Result<Page<Message>, DbError> {
        MessageRepo::new(&self.pool).sent(owner_id, filter, page).await
    }

    async fn create_image(&self, new: NewImage) -> Result<Image, DbError> {
        ImageRepo::new(&self.pool).create(new).await
    }

    async fn get_image(&self, id: Uuid) -> Result<Option<Image>, DbError> {
        ImageRepo::new(&self.pool).get(id).await
    }

    async fn list_images(&self, owner_id: Uuid, page: PageRequest) -> Result<Page<Image>, DbError> {
        ImageRepo::new(&self.pool).list_for_owner(owner_id, page).await
    }

    async fn delete_image(&self, id: Uuid) -> Result<bool, DbError> {
        ImageRepo::new(&self.pool).delete(id).await
    }

    async fn create_topic(&self, new: NewTopic) -> Result<Topic, DbError> {
        TopicRepo::new(&self.pool).create(new).await
    }

    async fn get_topic(&self, id: Uuid) -> Result<Option<Topic>, DbError> {
        TopicRepo::new(&self.pool).get(id).await
    }

    async fn list_topics(&self) -> Result<Vec<Topic>, DbError> {
        TopicRepo::new(&self.pool).list().await
    }
}
