//! HTTP server command
//!
//! Resolves settings from flags, environment and `~/.library/config.toml`
//! (in that order), then runs the server until Ctrl+C/SIGTERM.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use library_core::LibraryConfig;
use library_server::auth::SessionKeys;
use library_server::db::{create_pool_with_options, migrations, MemoryStore, PgStore, Store};
use library_server::{run_server, AppState, FixedWindowLimiter, ServerConfig};

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to (default from config: 127.0.0.1:3030)
    #[arg(long, short = 'b')]
    pub bind: Option<SocketAddr>,

    /// Allow permissive CORS (all origins) - use with caution
    #[arg(long)]
    pub cors_permissive: bool,

    /// Database URL (overrides config/environment)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Keep everything in memory instead of Postgres (data is lost on exit).
    /// Takes precedence over any database URL.
    #[arg(long)]
    pub in_memory: bool,

    /// Skip schema migration at startup
    #[arg(long)]
    pub no_migrate: bool,

    /// Disable per-client rate limiting
    #[arg(long)]
    pub no_rate_limit: bool,
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs) -> Result<()> {
    let config = LibraryConfig::load()?;
    config.validate()?;
    if config.uses_dev_secret() {
        tracing::warn!("session.secret is the built-in development secret; set LIBRARY_SESSION_SECRET");
    }

    let store: Arc<dyn Store> = if args.in_memory {
        tracing::warn!("Using in-memory store; data is lost on exit");
        Arc::new(MemoryStore::new())
    } else {
        let database_url = args.database_url.unwrap_or_else(|| config.database.url.clone());
        let pool = create_pool_with_options(&database_url, config.database.max_connections)
            .await
            .context("Failed to create database pool")?;
        if !args.no_migrate {
            migrations::run(&pool).await.context("Migration failed")?;
        }
        Arc::new(PgStore::new(pool))
    };

    let mut state = AppState::new(store, SessionKeys::new(&config.session))
        .trusting_forwarded_for(config.rate_limit.trust_forwarded_for);
    if config.rate_limit.enabled && !args.no_rate_limit {
        tracing::info!(
            max_requests = config.rate_limit.max_requests,
            window_secs = config.rate_limit.window_secs,
            trust_forwarded_for = config.rate_limit.trust_forwarded_for,
            "Rate limiting enabled"
        );
        state = state.with_rate_limiter(Arc::new(FixedWindowLimiter::new(
            config.rate_limit.max_requests,
            Duration::from_secs(config.rate_limit.window_secs),
        )));
    }

    let bind_addr = match args.bind {
        Some(addr) => addr,
        None => config
            .server
            .bind
            .parse()
            .with_context(|| format!("Invalid server.bind: {}", config.server.bind))?,
    };
    let server_config = ServerConfig {
        bind_addr,
        cors_permissive: args.cors_permissive || config.server.cors_permissive,
        request_timeout: Duration::from_secs(config.server.request_timeout_secs),
        sweep_interval: Duration::from_secs(config.rate_limit.sweep_interval_secs),
    };

    tracing::info!("Starting library server on {}", server_config.bind_addr);

    // Run server (blocks until shutdown)
    run_server(Arc::new(state), server_config)
        .await
        .context("Server error")?;

    Ok(())
}
