//! Direct messages between owners

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::ValidationError;

/// Maximum message length in characters
const MAX_CONTENT_LEN: usize = 10_000;

/// Validated message body.
///
/// Whitespace-only content counts as empty. Surrounding whitespace is
/// trimmed; interior formatting is kept as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageContent(String);

impl MessageContent {
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field: "content" });
        }
        if trimmed.chars().count() > MAX_CONTENT_LEN {
            return Err(ValidationError::TooLong {
                field: "content",
                max: MAX_CONTENT_LEN,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    pub sender_owner_id: Uuid,
    pub receiver_owner_id: Uuid,
    pub sender_org_id: Option<Uuid>,
    pub receiver_org_id: Option<Uuid>,
    pub content: String,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn is_read(&self) -> bool {
        self.read_at.is_some()
    }
}

/// Everything needed to insert a message. Org ids are captured from the
/// parties at write time and never recomputed.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub sender_owner_id: Uuid,
    pub receiver_owner_id: Uuid,
    pub sender_org_id: Option<Uuid>,
    pub receiver_org_id: Option<Uuid>,
    pub content: MessageContent,
}

/// Inbox/sent listing filters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MessageFilter {
    /// Only messages with `read_at IS NULL`
    pub unread_only: bool,
    /// Counterpart's denormalized org id
    pub counterpart_org_id: Option<Uuid>,
}
