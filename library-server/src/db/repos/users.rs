//! User repository
//!
//! Registration writes the user and its personal owner in one transaction.

use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use library_core::models::{Email, NewUser, Owner, ProfileUpdate, User, UserCredentials};

use super::owners::owner_from_row;
use super::{map_constraint, DbError};

const USER_COLUMNS: &str = "id, email, name, bio, interests, created_at, updated_at";

pub(crate) fn user_from_row(r: &PgRow) -> User {
    User {
        id: r.get("id"),
        email: r.get("email"),
        name: r.get("name"),
        bio: r.get("bio"),
        interests: r.get("interests"),
        created_at: r.get("created_at"),
        updated_at: r.get("updated_at"),
    }
}

pub struct UserRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, new: NewUser) -> Result<(User, Owner), DbError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            "INSERT INTO users (email, password_hash, name) VALUES ($1, $2, $3) RETURNING {USER_COLUMNS}"
        ))
        .bind(new.email.as_str())
        .bind(&new.password_hash)
        .bind(&new.name)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_constraint(e, "user", "email already registered"))?;
        let user = user_from_row(&row);

        let row = sqlx::query(
            "INSERT INTO owners (user_id) VALUES ($1) RETURNING id, user_id, org_id, created_at",
        )
        .bind(user.id)
        .fetch_one(&mut *tx)
        .await?;
        let owner = owner_from_row(&row)?;

        tx.commit().await?;
        Ok((user, owner))
    }

    pub async fn credentials(&self, email: &Email) -> Result<Option<UserCredentials>, DbError> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM users WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|r| UserCredentials {
            user: user_from_row(&r),
            password_hash: r.get("password_hash"),
        }))
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<User>, DbError> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    /// Partial update; untouched fields keep their stored value.
    pub async fn update(&self, id: Uuid, update: &ProfileUpdate) -> Result<User, DbError> {
        let (bio_set, bio) = match &update.bio {
            Some(bio) => (true, bio.as_deref()),
            None => (false, None),
        };

        let row = sqlx::query(&format!(
            r#"
            UPDATE users SET
                name = COALESCE($2, name),
                bio = CASE WHEN $3 THEN $4 ELSE bio END,
                interests = COALESCE($5, interests),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(update.name.as_deref())
        .bind(bio_set)
        .bind(bio)
        .bind(update.interests.as_deref())
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("user", id))?;

        Ok(user_from_row(&row))
    }
}
