//! `library config` subcommands

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use library_core::LibraryConfig;

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Write a config file with default values
    Init(InitArgs),
    /// Print the effective config (file + environment) as TOML
    Show,
    /// Validate the effective config
    Validate,
    /// Show config file path
    Path,
}

#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Force overwrite existing config
    #[arg(long, short)]
    pub force: bool,
}

pub fn run_config(args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommands::Init(args) => run_init(args),
        ConfigCommands::Show => run_show(),
        ConfigCommands::Validate => run_validate(),
        ConfigCommands::Path => run_path(),
    }
}

fn run_init(args: InitArgs) -> Result<()> {
    let config_path = LibraryConfig::config_path();

    if config_path.exists() && !args.force {
        anyhow::bail!("Config already exists at {:?}\n\nUse --force to overwrite", config_path);
    }

    LibraryConfig::default().save_to(&config_path)?;

    println!("✅ Created config at: {:?}", config_path);
    println!("\nNext steps:");
    println!("  1. Edit the config: $EDITOR {:?}", config_path);
    println!("  2. Set session.secret (or LIBRARY_SESSION_SECRET)");
    println!("  3. Run: library config validate");

    Ok(())
}

fn run_show() -> Result<()> {
    let mut config = LibraryConfig::load()?;
    if !config.session.secret.is_empty() {
        config.session.secret = "********".to_string();
    }

    let toml_str = toml::to_string_pretty(&config).context("Failed to serialize config to TOML")?;
    println!("{}", toml_str);

    Ok(())
}

fn run_validate() -> Result<()> {
    println!("🔍 Validating configuration...");

    let config = LibraryConfig::load()?;
    println!("   ✓ Config loaded successfully");

    config.validate()?;

    if config.uses_dev_secret() {
        println!("\n⚠️  session.secret is the development default; set LIBRARY_SESSION_SECRET");
    }

    println!("\n✅ Configuration valid!");
    Ok(())
}

fn run_path() -> Result<()> {
    println!("{}", LibraryConfig::config_path().display());
    Ok(())
}
