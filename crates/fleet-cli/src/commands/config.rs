//! Configuration management CLI commands.

use clap::{Args, Subcommand};

use fleet_cache::redis::client::mask_redis_url;
use fleet_core::config::StorageProvider;
use fleet_core::error::AppError;
use fleet_database::connection::mask_password;

use super::Cli;
use crate::output;

/// Arguments for config commands
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Config subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show effective configuration, with secrets masked
    Show,
    /// Validate configuration file
    Validate,
}

/// Execute config commands
pub async fn execute(args: &ConfigArgs, cli: &Cli) -> Result<(), AppError> {
    match &args.command {
        ConfigCommand::Show => {
            let mut config = cli.load_config()?;
            config.database.url = mask_password(&config.database.url);
            config.cache.redis.url = mask_redis_url(&config.cache.redis.url);
            output::print_item(&config, cli.format);
        }
        ConfigCommand::Validate => {
            let config = match cli.load_config() {
                Ok(config) => config,
                Err(e) => {
                    output::print_error(&format!("Configuration invalid: {e}"));
                    return Err(e);
                }
            };

            if config.database.provider == StorageProvider::Postgres
                && config.database.url.is_empty()
            {
                return Err(AppError::configuration("database.url is required for postgres"));
            }
            if config.database.min_connections > config.database.max_connections {
                return Err(AppError::configuration(
                    "database.min_connections exceeds max_connections",
                ));
            }
            if !matches!(config.cache.provider.as_str(), "memory" | "redis") {
                return Err(AppError::configuration(format!(
                    "Unknown cache provider: '{}'",
                    config.cache.provider
                )));
            }

            output::print_success(&format!("Configuration '{}' is valid", cli.config));
            output::print_kv("Database", &mask_password(&config.database.url));
            output::print_kv("Cache", &config.cache.provider);
            output::print_kv(
                "List invalidation",
                &format!("{:?}", config.cache.list_invalidation).to_lowercase(),
            );
            output::print_kv(
                "Tenant scope required",
                &config.database.require_tenant_scope.to_string(),
            );
        }
    }

    Ok(())
}
