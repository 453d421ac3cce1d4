//! Follow repository
//!
//! Duplicate follows are caught by the `(follower, following)` unique
//! constraint, not by a read before the insert.

use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use library_core::models::{Follow, FollowEdge, Page, PageRequest};

use super::owners::{summary_from_row, SUMMARY_COLUMNS, SUMMARY_JOINS};
use super::{map_constraint, window_total, DbError};

/// Which end of the edge a listing is anchored on.
#[derive(Debug, Clone, Copy)]
enum Direction {
    /// Owners following the anchor
    Followers,
    /// Owners the anchor follows
    Following,
}

impl Direction {
    /// (column matched against the anchor, column joined to owners)
    fn columns(self) -> (&'static str, &'static str) {
        match self {
            Self::Followers => ("following_owner_id", "follower_owner_id"),
            Self::Following => ("follower_owner_id", "following_owner_id"),
        }
    }
}

fn edge_from_row(r: &PgRow) -> Result<FollowEdge, DbError> {
    Ok(FollowEdge {
        owner: summary_from_row(r)?,
        followed_at: r.get("followed_at"),
    })
}

pub struct FollowRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> FollowRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, follower: Uuid, following: Uuid) -> Result<Follow, DbError> {
        let row = sqlx::query(
            r#"
            INSERT INTO follows (follower_owner_id, following_owner_id)
            VALUES ($1, $2)
            RETURNING id, follower_owner_id, following_owner_id, created_at
            "#,
        )
        .bind(follower)
        .bind(following)
        .fetch_one(self.pool)
        .await
        .map_err(|e| map_constraint(e, "follow", "already following"))?;

        Ok(Follow {
            id: row.get("id"),
            follower_owner_id: row.get("follower_owner_id"),
            following_owner_id: row.get("following_owner_id"),
            created_at: row.get("created_at"),
        })
    }

    pub async fn followers(&self, owner_id: Uuid, page: PageRequest) -> Result<Page<FollowEdge>, DbError> {
        self.list(Direction::Followers, owner_id, page).await
    }

    pub async fn following(&self, owner_id: Uuid, page: PageRequest) -> Result<Page<FollowEdge>, DbError> {
        self.list(Direction::Following, owner_id, page).await
    }

    /// Newest edges first, joined with display names.
    async fn list(&self, direction: Direction, owner_id: Uuid, page: PageRequest) -> Result<Page<FollowEdge>, DbError> {
        // Column names come from `Direction`, never from input.
        let (anchor, other) = direction.columns();
        let rows = sqlx::query(&format!(
            r#"
            SELECT
                {SUMMARY_COLUMNS},
                f.created_at AS followed_at,
                COUNT(*) OVER() AS total
            FROM follows f
            JOIN owners o ON o.id = f.{other}
            {SUMMARY_JOINS}
            WHERE f.{anchor} = $1
            ORDER BY f.created_at DESC, f.id DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(owner_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        let total = match window_total(&rows, page) {
            Some(total) => total,
            None => {
                sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM follows WHERE {anchor} = $1"))
                    .bind(owner_id)
                    .fetch_one(self.pool)
                    .await?
            }
        };
        let items = rows.iter().map(edge_from_row).collect::<Result<Vec<_>, _>>()?;

        Ok(Page {
            items,
            total,
            page: page.page,
            per_page: page.per_page,
        })
    }
}
