//! Org repository - orgs, their owner identity, memberships

use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use library_core::models::{NewOrg, Org, OrgMember, OrgRole, Owner};

use super::owners::owner_from_row;
use super::{map_constraint, DbError};
use crate::db::Membership;

fn org_from_row(r: &PgRow) -> Org {
    Org {
        id: r.get("id"),
        name: r.get("name"),
        slug: r.get("slug"),
        description: r.get("description"),
        created_at: r.get("created_at"),
    }
}

fn member_from_row(r: &PgRow) -> Result<OrgMember, DbError> {
    Ok(OrgMember {
        org_id: r.get("org_id"),
        user_id: r.get("user_id"),
        name: r.get("name"),
        role: OrgRole::parse(r.get::<&str, _>("role"))?,
        joined_at: r.get("created_at"),
    })
}

pub struct OrgRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> OrgRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Org, its owner row and the creator's membership in one transaction.
    pub async fn create(&self, new: NewOrg, creator: Uuid) -> Result<(Org, Owner), DbError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            r#"
            INSERT INTO orgs (name, slug, description)
            VALUES ($1, $2, $3)
            RETURNING id, name, slug, description, created_at
            "#,
        )
        .bind(&new.name)
        .bind(&new.slug)
        .bind(new.description.as_deref())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_constraint(e, "org", "slug already taken"))?;
        let org = org_from_row(&row);

        let row = sqlx::query(
            "INSERT INTO owners (org_id) VALUES ($1) RETURNING id, user_id, org_id, created_at",
        )
        .bind(org.id)
        .fetch_one(&mut *tx)
        .await?;
        let owner = owner_from_row(&row)?;

        sqlx::query("INSERT INTO org_memberships (org_id, user_id, role) VALUES ($1, $2, $3)")
            .bind(org.id)
            .bind(creator)
            .bind(OrgRole::Owner.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_constraint(e, "membership", "already a member"))?;

        tx.commit().await?;
        Ok((org, owner))
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Org>, DbError> {
        let row = sqlx::query("SELECT id, name, slug, description, created_at FROM orgs WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.as_ref().map(org_from_row))
    }

    pub async fn role(&self, org_id: Uuid, user_id: Uuid) -> Result<Option<OrgRole>, DbError> {
        let role: Option<String> =
            sqlx::query_scalar("SELECT role FROM org_memberships WHERE org_id = $1 AND user_id = $2")
                .bind(org_id)
                .bind(user_id)
                .fetch_optional(self.pool)
                .await?;

        Ok(role.as_deref().map(OrgRole::parse).transpose()?)
    }

    pub async fn members(&self, org_id: Uuid) -> Result<Vec<OrgMember>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT m.org_id, m.user_id, u.name, m.role, m.created_at
            FROM org_memberships m
            JOIN users u ON u.id = m.user_id
            WHERE m.org_id = $1
            ORDER BY m.created_at ASC
            "#,
        )
        .bind(org_id)
        .fetch_all(self.pool)
        .await?;

        rows.iter().map(member_from_row).collect()
    }

    /// Upsert a membership and return it joined with the member's name.
    ///
    /// The org row is locked first so role changes within one org run one
    /// at a time; the owner count read below is then current.
    pub async fn set_role(&self, org_id: Uuid, user_id: Uuid, role: OrgRole) -> Result<OrgMember, DbError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT id FROM orgs WHERE id = $1 FOR UPDATE")
            .bind(org_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::not_found("org", org_id))?;

        if role != OrgRole::Owner {
            let (is_owner, owners): (bool, i64) = sqlx::query_as(
                r#"
                SELECT
                    COALESCE(BOOL_OR(user_id = $2), FALSE),
                    COUNT(*)
                FROM org_memberships
                WHERE org_id = $1 AND role = $3
                "#,
            )
            .bind(org_id)
            .bind(user_id)
            .bind(OrgRole::Owner.as_str())
            .fetch_one(&mut *tx)
            .await?;
            if is_owner && owners <= 1 {
                return Err(DbError::LastOwner { org_id });
            }
        }

        let row = sqlx::query(
            r#"
            WITH upserted AS (
                INSERT INTO org_memberships (org_id, user_id, role)
                VALUES ($1, $2, $3)
                ON CONFLICT (org_id, user_id) DO UPDATE SET role = EXCLUDED.role
                RETURNING org_id, user_id, role, created_at
            )
            SELECT m.org_id, m.user_id, u.name, m.role, m.created_at
            FROM upserted m
            JOIN users u ON u.id = m.user_id
            "#,
        )
        .bind(org_id)
        .bind(user_id)
        .bind(role.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_constraint(e, "membership", "already a member"))?;
        let member = member_from_row(&row)?;

        tx.commit().await?;
        Ok(member)
    }

    pub async fn memberships(&self, user_id: Uuid) -> Result<Vec<Membership>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT
                g.id, g.name, g.slug, g.description, g.created_at,
                o.id AS owner_id, o.created_at AS owner_created_at,
                m.role
            FROM org_memberships m
            JOIN orgs g ON g.id = m.org_id
            JOIN owners o ON o.org_id = g.id
            WHERE m.user_id = $1
            ORDER BY g.name ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        rows.iter()
            .map(|r| {
                let org = org_from_row(r);
                let owner = Owner::from_columns(
                    r.get("owner_id"),
                    None,
                    Some(org.id),
                    r.get("owner_created_at"),
                )?;
                let role = OrgRole::parse(r.get::<&str, _>("role"))?;
                Ok(Membership { org, owner, role })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repos::testing::{pool, user};

    #[tokio::test]
    #[ignore = "requires database"]
    async fn concurrent_demotions_keep_an_owner() {
        let pool = pool().await;
        let (boss, _) = user(&pool, "boss").await;
        let (partner, _) = user(&pool, "partner").await;
        let slug = format!("acme-{}", Uuid::new_v4().simple());
        let repo = OrgRepo::new(&pool);
        let (org, _) = repo
            .create(NewOrg::new("Acme", &slug, None).unwrap(), boss.id)
            .await
            .unwrap();
        repo.set_role(org.id, partner.id, OrgRole::Owner).await.unwrap();

        let (repo_a, repo_b) = (OrgRepo::new(&pool), OrgRepo::new(&pool));
        let (first, second) = tokio::join!(
            repo_a.set_role(org.id, boss.id, OrgRole::Member),
            repo_b.set_role(org.id, partner.id, OrgRole::Member),
        );
        assert_eq!(
            [first.is_ok(), second.is_ok()].iter().filter(|ok| **ok).count(),
            1
        );
        let refused = first.err().or(second.err()).unwrap();
        assert!(matches!(refused, DbError::LastOwner { .. }));

        let owners = repo
            .members(org.id)
            .await
            .unwrap()
            .into_iter()
            .filter(|m| m.role == OrgRole::Owner)
            .count();
        assert_eq!(owners, 1);
    }
}

