//! Follow edges between owners

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::OwnerSummary;

/// Directed edge `follower -> following`, unique per ordered pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Follow {
    pub id: Uuid,
    pub follower_owner_id: Uuid,
    pub following_owner_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// One row of a followers/following listing: the owner on the other end
/// of the edge and when the edge was created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowEdge {
    pub owner: OwnerSummary,
    pub followed_at: DateTime<Utc>,
}
