//! library CLI - runs and administers the Project Library service
//!
//! - `serve`: HTTP API (Postgres or in-memory store)
//! - `migrate`: create or update the database schema
//! - `config`: inspect and initialize `~/.library/config.toml`

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod config;
mod tracing_setup;

#[derive(Parser, Debug)]
#[command(
    name = "library",
    author,
    version,
    about = "Project Library: owners, follows, messages, orgs, images and topics over HTTP"
)]
struct Cli {
    /// Debug logging (unless RUST_LOG is set)
    #[arg(long, global = true)]
    debug: bool,

    /// Export traces over OTLP (requires the `telemetry` feature)
    #[arg(long, global = true)]
    otel: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API server
    Serve(commands::serve::ServeArgs),
    /// Apply the database schema (idempotent)
    Migrate(commands::migrate::MigrateArgs),
    /// Manage library configuration (init, show, validate, path)
    Config(config::ConfigArgs),
}

/// `.env` in the working directory, then `~/.library/.env`.
fn load_dotenv() {
    let _ = dotenvy::dotenv();
    if let Some(home) = std::env::var_os("HOME") {
        let _ = dotenvy::from_path(std::path::Path::new(&home).join(".library/.env"));
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    load_dotenv();
    let cli = Cli::parse();

    tracing_setup::init(&tracing_setup::TracingConfig {
        debug: cli.debug,
        otel: cli.otel,
    })?;

    let result = match cli.command {
        Commands::Serve(args) => commands::serve::run_serve(args).await,
        Commands::Migrate(args) => commands::migrate::run_migrate(args).await,
        Commands::Config(args) => config::run_config(args),
    };

    tracing_setup::shutdown_otel();
    result
}
