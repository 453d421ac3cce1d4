//! Owner identities
//!
//! An owner is the actor behind follows, messages and content. It is backed
//! by exactly one user or exactly one org; [`OwnerBacking`] makes the
//! "user xor org" rule unrepresentable to break once a row has been read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ValidationError;

/// Discriminant exposed over the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OwnerKind {
    User,
    Org,
}

/// The single entity an owner stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OwnerBacking {
    User(Uuid),
    Org(Uuid),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner {
    pub id: Uuid,
    pub backing: OwnerBacking,
    pub created_at: DateTime<Utc>,
}

impl Owner {
    /// Build an owner from nullable storage columns.
    ///
    /// Fails unless exactly one of `user_id` / `org_id` is set.
    pub fn from_columns(
        id: Uuid,
        user_id: Option<Uuid>,
        org_id: Option<Uuid>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let backing = match (user_id, org_id) {
            (Some(user), None) => OwnerBacking::User(user),
            (None, Some(org)) => OwnerBacking::Org(org),
            (Some(_), Some(_)) => {
                return Err(ValidationError::Corrupt {
                    entity: "owner",
                    reason: "both user and org set",
                })
            }
            (None, None) => {
                return Err(ValidationError::Corrupt {
                    entity: "owner",
                    reason: "neither user nor org set",
                })
            }
        };

        Ok(Self {
            id,
            backing,
            created_at,
        })
    }

    pub fn kind(&self) -> OwnerKind {
        match self.backing {
            OwnerBacking::User(_) => OwnerKind::User,
            OwnerBacking::Org(_) => OwnerKind::Org,
        }
    }

    pub fn user_id(&self) -> Option<Uuid> {
        match self.backing {
            OwnerBacking::User(id) => Some(id),
            OwnerBacking::Org(_) => None,
        }
    }

    pub fn org_id(&self) -> Option<Uuid> {
        match self.backing {
            OwnerBacking::Org(id) => Some(id),
            OwnerBacking::User(_) => None,
        }
    }
}

/// Owner joined with what the UI shows for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerSummary {
    pub id: Uuid,
    pub kind: OwnerKind,
    pub display_name: String,
    /// Backing user or org id
    pub entity_id: Uuid,
}

/// Public owner profile with relationship counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerProfile {
    #[serde(flatten)]
    pub owner: OwnerSummary,
    pub follower_count: i64,
    pub following_count: i64,
}
