//! Schema migration command

use anyhow::{Context, Result};
use clap::Parser;

use library_core::LibraryConfig;
use library_server::db::{create_pool, migrations};

/// Arguments for the migrate command
#[derive(Parser, Debug)]
pub struct MigrateArgs {
    /// Database URL (overrides config/environment)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,
}

pub async fn run_migrate(args: MigrateArgs) -> Result<()> {
    let config = LibraryConfig::load()?;
    let database_url = args.database_url.unwrap_or(config.database.url);

    let pool = create_pool(&database_url)
        .await
        .context("Failed to create database pool")?;
    migrations::run(&pool).await.context("Migration failed")?;

    println!("✅ Schema is up to date");
    Ok(())
}
