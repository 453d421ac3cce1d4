//! In-memory [`Store`] for tests and `serve --in-memory`
//!
//! Mirrors the Postgres constraints: unique emails/slugs/follow pairs,
//! user-xor-org owners, no self-follow, `COALESCE(read_at, now)`.
//! Listings are newest-first by insertion order.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use library_core::models::{
    Email, Follow, FollowEdge, Image, Message, MessageFilter, NewImage, NewMessage, NewOrg,
    NewTopic, NewUser, Org, OrgMember, OrgRole, Owner, OwnerBacking, OwnerProfile, OwnerSummary,
    Page, PageRequest, ProfileUpdate, Topic, User, UserCredentials,
};

use super::repos::owners::summarize;
use super::{DbError, Membership, Store};

struct StoredUser {
    user: User,
    password_hash: String,
}

struct StoredMembership {
    org_id: Uuid,
    user_id: Uuid,
    role: OrgRole,
    created_at: DateTime<Utc>,
}

#[derive(Default)]
struct Inner {
    users: Vec<StoredUser>,
    orgs: Vec<Org>,
    owners: Vec<Owner>,
    memberships: Vec<StoredMembership>,
    follows: Vec<Follow>,
    messages: Vec<Message>,
    images: Vec<Image>,
    topics: Vec<Topic>,
}

impl Inner {
    fn user(&self, id: Uuid) -> Option<&User> {
        self.users.iter().map(|s| &s.user).find(|u| u.id == id)
    }

    fn org(&self, id: Uuid) -> Option<&Org> {
        self.orgs.iter().find(|o| o.id == id)
    }

    fn owner(&self, id: Uuid) -> Option<&Owner> {
        self.owners.iter().find(|o| o.id == id)
    }

    fn summary(&self, owner: &Owner) -> Option<OwnerSummary> {
        let name = match owner.backing {
            OwnerBacking::User(id) => self.user(id)?.name.clone(),
            OwnerBacking::Org(id) => self.org(id)?.name.clone(),
        };
        Some(summarize(owner, name))
    }

    fn member(&self, m: &StoredMembership) -> Option<OrgMember> {
        Some(OrgMember {
            org_id: m.org_id,
            user_id: m.user_id,
            name: self.user(m.user_id)?.name.clone(),
            role: m.role,
            joined_at: m.created_at,
        })
    }

    fn new_owner(&mut self, backing: OwnerBacking) -> Owner {
        let owner = Owner {
            id: Uuid::new_v4(),
            backing,
            created_at: Utc::now(),
        };
        self.owners.push(owner.clone());
        owner
    }

    /// Newest-first edges, keeping the owner on the `pick` end of each follow.
    fn edges(&self, matches: impl Fn(&Follow) -> bool, pick: impl Fn(&Follow) -> Uuid) -> Vec<FollowEdge> {
        self.follows
            .iter()
            .rev()
            .filter(|f| matches(f))
            .filter_map(|f| {
                let owner = self.owner(pick(f))?;
                Some(FollowEdge {
                    owner: self.summary(owner)?,
                    followed_at: f.created_at,
                })
            })
            .collect()
    }
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, new: NewUser) -> Result<(User, Owner), DbError> {
        let mut inner = self.inner.write().await;
        if inner.users.iter().any(|s| s.user.email == new.email.as_str()) {
            return Err(DbError::Conflict {
                resource: "user",
                detail: "email already registered".into(),
            });
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: new.email.as_str().to_owned(),
            name: new.name,
            bio: None,
            interests: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        inner.users.push(StoredUser {
            user: user.clone(),
            password_hash: new.password_hash,
        });
        let owner = inner.new_owner(OwnerBacking::User(user.id));
        Ok((user, owner))
    }

    async fn user_credentials(&self, email: &Email) -> Result<Option<UserCredentials>, DbError> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .iter()
            .find(|s| s.user.email == email.as_str())
            .map(|s| UserCredentials {
                user: s.user.clone(),
                password_hash: s.password_hash.clone(),
            }))
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, DbError> {
        Ok(self.inner.read().await.user(id).cloned())
    }

    async fn update_user(&self, id: Uuid, update: &ProfileUpdate) -> Result<User, DbError> {
        let mut inner = self.inner.write().await;
        let stored = inner
            .users
            .iter_mut()
            .find(|s| s.user.id == id)
            .ok_or_else(|| DbError::not_found("user", id))?;
        update.apply(&mut stored.user);
        stored.user.updated_at = Utc::now();
        Ok(stored.user.clone())
    }

    async fn get_owner(&self, id: Uuid) -> Result<Option<Owner>, DbError> {
        Ok(self.inner.read().await.owner(id).cloned())
    }

    async fn personal_owner(&self, user_id: Uuid) -> Result<Option<Owner>, DbError> {
        let inner = self.inner.read().await;
        Ok(inner
            .owners
            .iter()
            .find(|o| o.backing == OwnerBacking::User(user_id))
            .cloned())
    }

    async fn owner_summary(&self, id: Uuid) -> Result<Option<OwnerSummary>, DbError> {
        let inner = self.inner.read().await;
        Ok(inner.owner(id).and_then(|o| inner.summary(o)))
    }

    async fn owner_profile(&self, id: Uuid) -> Result<Option<OwnerProfile>, DbError> {
        let inner = self.inner.read().await;
        let Some(summary) = inner.owner(id).and_then(|o| inner.summary(o)) else {
            return Ok(None);
        };
        let follower_count = inner.follows.iter().filter(|f| f.following_owner_id == id).count();
        let following_count = inner.follows.iter().filter(|f| f.follower_owner_id == id).count();
        Ok(Some(OwnerProfile {
            owner: summary,
            follower_count: follower_count as i64,
            following_count: following_count as i64,
        }))
    }

    async fn create_org(&self, new: NewOrg, creator: Uuid) -> Result<(Org, Owner), DbError> {
        let mut inner = self.inner.write().await;
        if inner.orgs.iter().any(|o| o.slug == new.slug) {
            return Err(DbError::Conflict {
                resource: "org",
                detail: "slug already taken".into(),
            });
        }
        if inner.user(creator).is_none() {
            return Err(DbError::not_found("user", creator));
        }

        let now = Utc::now();
        let org = Org {
            id: Uuid::new_v4(),
            name: new.name,
            slug: new.slug,
            description: new.description,
            created_at: now,
        };
        inner.orgs.push(org.clone());
        let owner = inner.new_owner(OwnerBacking::Org(org.id));
        inner.memberships.push(StoredMembership {
            org_id: org.id,
            user_id: creator,
            role: OrgRole::Owner,
            created_at: now,
        });
        Ok((org, owner))
    }

    async fn get_org(&self, id: Uuid) -> Result<Option<Org>, DbError> {
        Ok(self.inner.read().await.org(id).cloned())
    }

    async fn membership_role(&self, org_id: Uuid, user_id: Uuid) -> Result<Option<OrgRole>, DbError> {
        let inner = self.inner.read().await;
        Ok(inner
            .memberships
            .iter()
            .find(|m| m.org_id == org_id && m.user_id == user_id)
            .map(|m| m.role))
    }

    async fn list_members(&self, org_id: Uuid) -> Result<Vec<OrgMember>, DbError> {
        let inner = self.inner.read().await;
        Ok(inner
            .memberships
            .iter()
            .filter(|m| m.org_id == org_id)
            .filter_map(|m| inner.member(m))
            .collect())
    }

    async fn set_member_role(&self, org_id: Uuid, user_id: Uuid, role: OrgRole) -> Result<OrgMember, DbError> {
        let mut inner = self.inner.write().await;
        if inner.org(org_id).is_none() {
            return Err(DbError::not_found("org", org_id));
        }
        if inner.user(user_id).is_none() {
            return Err(DbError::not_found("user", user_id));
        }

        let existing = inner
            .memberships
            .iter()
            .position(|m| m.org_id == org_id && m.user_id == user_id);
        if let Some(index) = existing {
            let owners = inner
                .memberships
                .iter()
                .filter(|m| m.org_id == org_id && m.role == OrgRole::Owner)
                .count();
            if inner.memberships[index].role == OrgRole::Owner && role != OrgRole::Owner && owners <= 1 {
                return Err(DbError::LastOwner { org_id });
            }
        }

        let index = match existing {
            Some(index) => {
                inner.memberships[index].role = role;
                index
            }
            None => {
                inner.memberships.push(StoredMembership {
                    org_id,
                    user_id,
                    role,
                    created_at: Utc::now(),
                });
                inner.memberships.len() - 1
            }
        };

        inner
            .member(&inner.memberships[index])
            .ok_or_else(|| DbError::not_found("user", user_id))
    }

    async fn memberships(&self, user_id: Uuid) -> Result<Vec<Membership>, DbError> {
        let inner = self.inner.read().await;
        let mut out: Vec<Membership> = inner
            .memberships
            .iter()
            .filter(|m| m.user_id == user_id)
            .filter_map(|m| {
                let org = inner.org(m.org_id)?.clone();
                let owner = inner
                    .owners
                    .iter()
                    .find(|o| o.backing == OwnerBacking::Org(m.org_id))?
                    .clone();
                Some(Membership {
                    org,
                    owner,
                    role: m.role,
                })
            })
            .collect();
        out.sort_by(|a, b| a.org.name.cmp(&b.org.name));
        Ok(out)
    }

    async fn create_follow(&self, follower: Uuid, following: Uuid) -> Result<Follow, DbError> {
        let mut inner = self.inner.write().await;
        if inner.owner(follower).is_none() {
            return Err(DbError::not_found("owner", follower));
        }
        if inner.owner(following).is_none() {
            return Err(DbError::not_found("owner", following));
        }
        if inner
            .follows
            .iter()
            .any(|f| f.follower_owner_id == follower && f.following_owner_id == following)
        {
            return Err(DbError::Conflict {
                resource: "follow",
                detail: "already following".into(),
            });
        }

        let follow = Follow {
            id: Uuid::new_v4(),
            follower_owner_id: follower,
            following_owner_id: following,
            created_at: Utc::now(),
        };
        inner.follows.push(follow.clone());
        Ok(follow)
    }

    async fn list_followers(&self, owner_id: Uuid, page: PageRequest) -> Result<Page<FollowEdge>, DbError> {
        let inner = self.inner.read().await;
        let edges = inner.edges(|f| f.following_owner_id == owner_id, |f| f.follower_owner_id);
        Ok(page.slice(&edges))
    }

    async fn list_following(&self, owner_id: Uuid, page: PageRequest) -> Result<Page<FollowEdge>, DbError> {
        let inner = self.inner.read().await;
        let edges = inner.edges(|f| f.follower_owner_id == owner_id, |f| f.following_owner_id);
        Ok(page.slice(&edges))
    }

    async fn create_message(&self, new: NewMessage) -> Result<Message, DbError> {
        let mut inner = self.inner.write().await;
        for id in [new.sender_owner_id, new.receiver_owner_id] {
            if inner.owner(id).is_none() {
                return Err(DbError::not_found("owner", id));
            }
        }

        let message = Message {
            id: Uuid::new_v4(),
            sender_owner_id: new.sender_owner_id,
            receiver_owner_id: new.receiver_owner_id,
            sender_org_id: new.sender_org_id,
            receiver_org_id: new.receiver_org_id,
            content: new.content.into_string(),
            read_at: None,
            created_at: Utc::now(),
        };
        inner.messages.push(message.clone());
        Ok(message)
    }

    async fn get_message(&self, id: Uuid) -> Result<Option<Message>, DbError> {
        let inner = self.inner.read().await;
        Ok(inner.messages.iter().find(|m| m.id == id).cloned())
    }

    async fn mark_message_read(&self, id: Uuid, at: DateTime<Utc>) -> Result<Message, DbError> {
        let mut inner = self.inner.write().await;
        let message = inner
            .messages
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| DbError::not_found("message", id))?;
        message.read_at = message.read_at.or(Some(at));
        Ok(message.clone())
    }

    async fn inbox(&self, owner_id: Uuid, filter: MessageFilter, page: PageRequest) -> Result<Page<Message>, DbError> {
        let inner = self.inner.read().await;
        let matching: Vec<Message> = inner
            .messages
            .iter()
            .rev()
            .filter(|m| m.receiver_owner_id == owner_id)
            .filter(|m| !filter.unread_only || m.read_at.is_none())
            .filter(|m| filter.counterpart_org_id.map_or(true, |org| m.sender_org_id == Some(org)))
            .cloned()
            .collect();
        Ok(page.slice(&matching))
    }

    async fn sent(&self, owner_id: Uuid, filter: MessageFilter, page: PageRequest) -> Result<Page<Message>, DbError> {
        let inner = self.inner.read().await;
        let matching: Vec<Message> = inner
            .messages
            .iter()
            .rev()
            .filter(|m| m.sender_owner_id == owner_id)
            .filter(|m| !filter.unread_only || m.read_at.is_none())
            .filter(|m| filter.counterpart_org_id.map_or(true, |org| m.receiver_org_id == Some(org)))
            .cloned()
            .collect();
        Ok(page.slice(&matching))
    }

    async fn create_image(&self, new: NewImage) -> Result<Image, DbError> {
        let mut inner = self.inner.write().await;
        if inner.owner(new.owner_id).is_none() {
            return Err(DbError::not_found("owner", new.owner_id));
        }
        let image = Image {
            id: Uuid::new_v4(),
            owner_id: new.owner_id,
            url: new.url,
            caption: new.caption,
            created_at: Utc::now(),
        };
        inner.images.push(image.clone());
        Ok(image)
    }

    async fn get_image(&self, id: Uuid) -> Result<Option<Image>, DbError> {
        let inner = self.inner.read().await;
        Ok(inner.images.iter().find(|i| i.id == id).cloned())
    }

    async fn list_images(&self, owner_id: Uuid, page: PageRequest) -> Result<Page<Image>, DbError> {
        let inner = self.inner.read().await;
        let images: Vec<Image> = inner
            .images
            .iter()
            .rev()
            .filter(|i| i.owner_id == owner_id)
            .cloned()
            .collect();
        Ok(page.slice(&images))
    }

    async fn delete_image(&self, id: Uuid) -> Result<bool, DbError> {
        let mut inner = self.inner.write().await;
        let before = inner.images.len();
        inner.images.retain(|i| i.id != id);
        Ok(inner.images.len() < before)
    }

    async fn create_topic(&self, new: NewTopic) -> Result<Topic, DbError> {
        let mut inner = self.inner.write().await;
        if inner.topics.iter().any(|t| t.slug == new.slug) {
            return Err(DbError::Conflict {
                resource: "topic",
                detail: "slug already exists".into(),
            });
        }
        if let Some(parent) = new.parent_id {
            if !inner.topics.iter().any(|t| t.id == parent) {
                return Err(DbError::not_found("topic", parent));
            }
        }

        let topic = Topic {
            id: Uuid::new_v4(),
            name: new.name,
            slug: new.slug,
            parent_id: new.parent_id,
            created_at: Utc::now(),
        };
        inner.topics.push(topic.clone());
        Ok(topic)
    }

    async fn get_topic(&self, id: Uuid) -> Result<Option<Topic>, DbError> {
        let inner = self.inner.read().await;
        Ok(inner.topics.iter().find(|t| t.id == id).cloned())
    }

    async fn list_topics(&self) -> Result<Vec<Topic>, DbError> {
        let inner = self.inner.read().await;
        let mut topics = inner.topics.clone();
        topics.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(topics)
    }
}
