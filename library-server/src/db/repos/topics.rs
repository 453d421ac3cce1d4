//! Topic repository - flat rows; nesting happens in `build_tree`

use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use library_core::models::{NewTopic, Topic};

use super::{map_constraint, DbError};

fn topic_from_row(r: &PgRow) -> Topic {
    Topic {
        id: r.get("id"),
        name: r.get("name"),
        slug: r.get("slug"),
        parent_id: r.get("parent_id"),
        created_at: r.get("created_at"),
    }
}

pub struct TopicRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> TopicRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, new: NewTopic) -> Result<Topic, DbError> {
        let row = sqlx::query(
            r#"
            INSERT INTO topics (name, slug, parent_id)
            VALUES ($1, $2, $3)
            RETURNING id, name, slug, parent_id, created_at
            "#,
        )
        .bind(&new.name)
        .bind(&new.slug)
        .bind(new.parent_id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| map_constraint(e, "topic", "slug already exists"))?;

        Ok(topic_from_row(&row))
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Topic>, DbError> {
        let row = sqlx::query("SELECT id, name, slug, parent_id, created_at FROM topics WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.as_ref().map(topic_from_row))
    }

    pub async fn list(&self) -> Result<Vec<Topic>, DbError> {
        let rows = sqlx::query("SELECT id, name, slug, parent_id, created_at FROM topics ORDER BY name ASC")
            .fetch_all(self.pool)
            .await?;

        Ok(rows.iter().map(topic_from_row).collect())
    }
}
