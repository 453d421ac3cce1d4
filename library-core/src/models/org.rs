//! Organizations and membership roles

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::validation::{bounded, ValidationError};

const MAX_NAME_LEN: usize = 100;
pub(crate) const MAX_SLUG_LEN: usize = 64;
const MAX_DESCRIPTION_LEN: usize = 2000;

static SLUG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("slug regex is valid"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Org {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Role a user holds inside an org.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrgRole {
    Owner,
    Admin,
    Member,
}

impl OrgRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Admin => "admin",
            Self::Member => "member",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s {
            "owner" => Ok(Self::Owner),
            "admin" => Ok(Self::Admin),
            "member" => Ok(Self::Member),
            other => Err(ValidationError::InvalidVariant {
                field: "role",
                value: other.to_owned(),
            }),
        }
    }

    /// Whether the role lets a user act as the org's owner identity.
    pub fn can_act_as_org(&self) -> bool {
        matches!(self, Self::Owner | Self::Admin)
    }

    /// Whether the role lets a user add members or change their roles.
    pub fn can_manage_members(&self) -> bool {
        matches!(self, Self::Owner | Self::Admin)
    }

    /// Whether a holder of this role may hand out `granted`.
    pub fn can_grant(&self, granted: OrgRole) -> bool {
        match granted {
            OrgRole::Owner => *self == OrgRole::Owner,
            OrgRole::Admin | OrgRole::Member => self.can_manage_members(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgMember {
    pub org_id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub role: OrgRole,
    pub joined_at: DateTime<Utc>,
}

/// Validated input for creating an org.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrg {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
}

impl NewOrg {
    pub fn new(name: &str, slug: &str, description: Option<&str>) -> Result<Self, ValidationError> {
        let name = bounded("name", name, MAX_NAME_LEN)?;
        let slug = validate_slug(slug)?;
        let description = description
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(|d| bounded("description", d, MAX_DESCRIPTION_LEN))
            .transpose()?;

        Ok(Self {
            name,
            slug,
            description,
        })
    }
}

/// Lowercase, hyphen-separated `[a-z0-9]` runs.
pub fn validate_slug(slug: &str) -> Result<String, ValidationError> {
    let slug = bounded("slug", slug, MAX_SLUG_LEN)?;
    if !SLUG_RE.is_match(&slug) {
        return Err(ValidationError::InvalidFormat {
            field: "slug",
            reason: "use lowercase letters, digits and single hyphens",
        });
    }
    Ok(slug)
}
