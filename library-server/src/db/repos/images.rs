//! Image repository

use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use library_core::models::{Image, NewImage, Page, PageRequest};

use super::{window_total, DbError};

fn image_from_row(r: &PgRow) -> Image {
    Image {
        id: r.get("id"),
        owner_id: r.get("owner_id"),
        url: r.get("url"),
        caption: r.get("caption"),
        created_at: r.get("created_at"),
    }
}

pub struct ImageRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> ImageRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, new: NewImage) -> Result<Image, DbError> {
        let row = sqlx::query(
            r#"
            INSERT INTO images (owner_id, url, caption)
            VALUES ($1, $2, $3)
            RETURNING id, owner_id, url, caption, created_at
            "#,
        )
        .bind(new.owner_id)
        .bind(&new.url)
        .bind(new.caption.as_deref())
        .fetch_one(self.pool)
        .await?;

        Ok(image_from_row(&row))
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Image>, DbError> {
        let row = sqlx::query("SELECT id, owner_id, url, caption, created_at FROM images WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.as_ref().map(image_from_row))
    }

    pub async fn list_for_owner(&self, owner_id: Uuid, page: PageRequest) -> Result<Page<Image>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT id, owner_id, url, caption, created_at, COUNT(*) OVER() AS total
            FROM images
            WHERE owner_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(owner_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        let total = match window_total(&rows, page) {
            Some(total) => total,
            None => {
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM images WHERE owner_id = $1")
                    .bind(owner_id)
                    .fetch_one(self.pool)
                    .await?
            }
        };

        Ok(Page {
            total,
            items: rows.iter().map(image_from_row).collect(),
            page: page.page,
            per_page: page.per_page,
        })
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM images WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
