//! Owner repository - identity lookups and display-name joins

use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use library_core::models::{Owner, OwnerProfile, OwnerSummary};

use super::DbError;

/// Columns for an owner joined with its display name. Callers add
/// `FROM owners o LEFT JOIN users u ... LEFT JOIN orgs g ...`.
pub(crate) const SUMMARY_COLUMNS: &str =
    "o.id, o.user_id, o.org_id, o.created_at, COALESCE(u.name, g.name) AS display_name";

pub(crate) const SUMMARY_JOINS: &str =
    "LEFT JOIN users u ON u.id = o.user_id LEFT JOIN orgs g ON g.id = o.org_id";

pub(crate) fn owner_from_row(r: &PgRow) -> Result<Owner, DbError> {
    Ok(Owner::from_columns(
        r.get("id"),
        r.get("user_id"),
        r.get("org_id"),
        r.get("created_at"),
    )?)
}

pub(crate) fn summary_from_row(r: &PgRow) -> Result<OwnerSummary, DbError> {
    let owner = owner_from_row(r)?;
    Ok(summarize(&owner, r.get("display_name")))
}

pub(crate) fn summarize(owner: &Owner, display_name: String) -> OwnerSummary {
    OwnerSummary {
        id: owner.id,
        kind: owner.kind(),
        display_name,
        entity_id: owner.user_id().or(owner.org_id()).unwrap_or(owner.id),
    }
}

pub struct OwnerRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> OwnerRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Owner>, DbError> {
        sqlx::query("SELECT id, user_id, org_id, created_at FROM owners WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .as_ref()
            .map(owner_from_row)
            .transpose()
    }

    pub async fn for_user(&self, user_id: Uuid) -> Result<Option<Owner>, DbError> {
        sqlx::query("SELECT id, user_id, org_id, created_at FROM owners WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(self.pool)
            .await?
            .as_ref()
            .map(owner_from_row)
            .transpose()
    }

    pub async fn summary(&self, id: Uuid) -> Result<Option<OwnerSummary>, DbError> {
        sqlx::query(&format!(
            "SELECT {SUMMARY_COLUMNS} FROM owners o {SUMMARY_JOINS} WHERE o.id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .as_ref()
        .map(summary_from_row)
        .transpose()
    }

    /// Summary plus follower/following counts in one round trip.
    pub async fn profile(&self, id: Uuid) -> Result<Option<OwnerProfile>, DbError> {
        let row = sqlx::query(&format!(
            r#"
            SELECT
                {SUMMARY_COLUMNS},
                (SELECT COUNT(*) FROM follows f WHERE f.following_owner_id = o.id) AS follower_count,
                (SELECT COUNT(*) FROM follows f WHERE f.follower_owner_id = o.id) AS following_count
            FROM owners o {SUMMARY_JOINS}
            WHERE o.id = $1
            "#
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(|r| {
            Ok(OwnerProfile {
                owner: summary_from_row(&r)?,
                follower_count: r.get("follower_count"),
                following_count: r.get("following_count"),
            })
        })
        .transpose()
    }
}
