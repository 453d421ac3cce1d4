//! Schema migrations
//!
//! Every statement is idempotent so `run` is safe on each startup.

use sqlx::PgPool;

const STATEMENTS: &[(&str, &str)] = &[
    (
        "users",
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            name TEXT NOT NULL,
            bio TEXT,
            interests TEXT[] NOT NULL DEFAULT '{}',
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "orgs",
        r#"
        CREATE TABLE IF NOT EXISTS orgs (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            name TEXT NOT NULL,
            slug TEXT NOT NULL UNIQUE,
            description TEXT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "owners",
        r#"
        CREATE TABLE IF NOT EXISTS owners (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            user_id UUID UNIQUE REFERENCES users(id) ON DELETE CASCADE,
            org_id UUID UNIQUE REFERENCES orgs(id) ON DELETE CASCADE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            CONSTRAINT owners_exactly_one_backing CHECK ((user_id IS NULL) <> (org_id IS NULL))
        )
        "#,
    ),
    (
        "org_memberships",
        r#"
        CREATE TABLE IF NOT EXISTS org_memberships (
            org_id UUID NOT NULL REFERENCES orgs(id) ON DELETE CASCADE,
            user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            role TEXT NOT NULL CHECK (role IN ('owner', 'admin', 'member')),
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            PRIMARY KEY (org_id, user_id)
        )
        "#,
    ),
    (
        "follows",
        r#"
        CREATE TABLE IF NOT EXISTS follows (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            follower_owner_id UUID NOT NULL REFERENCES owners(id) ON DELETE CASCADE,
            following_owner_id UUID NOT NULL REFERENCES owners(id) ON DELETE CASCADE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            CONSTRAINT follows_pair_unique UNIQUE (follower_owner_id, following_owner_id),
            CONSTRAINT follows_no_self CHECK (follower_owner_id <> following_owner_id)
        )
        "#,
    ),
    (
        "follows_following_idx",
        "CREATE INDEX IF NOT EXISTS follows_following_idx ON follows (following_owner_id, created_at DESC)",
    ),
    (
        "messages",
        r#"
        CREATE TABLE IF NOT EXISTS messages (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            sender_owner_id UUID NOT NULL REFERENCES owners(id) ON DELETE CASCADE,
            receiver_owner_id UUID NOT NULL REFERENCES owners(id) ON DELETE CASCADE,
            sender_org_id UUID,
            receiver_org_id UUID,
            content TEXT NOT NULL CHECK (length(btrim(content)) > 0),
            read_at TIMESTAMPTZ,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            CONSTRAINT messages_no_self CHECK (sender_owner_id <> receiver_owner_id)
        )
        "#,
    ),
    (
        "messages_receiver_idx",
        "CREATE INDEX IF NOT EXISTS messages_receiver_idx ON messages (receiver_owner_id, created_at DESC)",
    ),
    (
        "messages_sender_idx",
        "CREATE INDEX IF NOT EXISTS messages_sender_idx ON messages (sender_owner_id, created_at DESC)",
    ),
    (
        "images",
        r#"
        CREATE TABLE IF NOT EXISTS images (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            owner_id UUID NOT NULL REFERENCES owners(id) ON DELETE CASCADE,
            url TEXT NOT NULL,
            caption TEXT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "topics",
        r#"
        CREATE TABLE IF NOT EXISTS topics (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            name TEXT NOT NULL,
            slug TEXT NOT NULL UNIQUE,
            parent_id UUID REFERENCES topics(id) ON DELETE SET NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
];

/// Run all migrations
pub async fn run(pool: &PgPool) -> Result<(), sqlx::Error> {
    tracing::info!("Running migrations...");

    for (name, sql) in STATEMENTS {
        tracing::debug!(migration = name, "applying");
        sqlx::query(sql).execute(pool).await?;
    }

    tracing::info!(count = STATEMENTS.len(), "Migrations complete");
    Ok(())
}
