//! CLI command definitions and dispatch.

pub mod cache;
pub mod config;
pub mod health;
pub mod migrate;

use clap::{Parser, Subcommand};

use fleet_core::config::AppConfig;
use fleet_core::error::AppError;
use fleet_database::DatabasePool;

use crate::output::OutputFormat;

/// Fleet data-access operator tool
#[derive(Debug, Parser)]
#[command(name = "fleet-cli", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Environment overlay, loaded from `config/{env}.toml`
    #[arg(short, long)]
    pub env: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Database migration management
    Migrate(migrate::MigrateArgs),
    /// Check storage and cache reachability
    Health,
    /// Cache maintenance
    Cache(cache::CacheArgs),
    /// Configuration management
    Config(config::ConfigArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        match &self.command {
            Commands::Migrate(args) => migrate::execute(args, self).await,
            Commands::Health => health::execute(self).await,
            Commands::Cache(args) => cache::execute(args, self).await,
            Commands::Config(args) => config::execute(args, self).await,
        }
    }

    /// Load configuration from the selected file and environment.
    pub fn load_config(&self) -> Result<AppConfig, AppError> {
        AppConfig::load(&self.config, self.env.as_deref())
            .map_err(|e| e.context(format!("load config '{}'", self.config)))
    }
}

/// Helper: open the configured storage, migrating it when
/// `database.run_migrations` is set
pub async fn connect_storage(config: &AppConfig) -> Result<DatabasePool, AppError> {
    let db = DatabasePool::connect(&config.database).await?;
    if config.database.run_migrations {
        fleet_database::migration::run_migrations(&db).await?;
    }
    Ok(db)
}
