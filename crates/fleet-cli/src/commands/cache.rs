//! Cache maintenance commands.

use clap::{Args, Subcommand, ValueEnum};

use fleet_cache::CacheManager;
use fleet_core::error::AppError;
use fleet_database::Entity;
use fleet_entity::{Driver, Invoice, Payment, Vehicle};

use super::Cli;
use crate::output;

/// Arguments for cache commands
#[derive(Debug, Args)]
pub struct CacheArgs {
    /// Cache subcommand
    #[command(subcommand)]
    pub command: CacheCommand,
}

/// Cached entity types
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EntityKind {
    Invoice,
    Payment,
    Vehicle,
    Driver,
}

impl EntityKind {
    fn name(self) -> &'static str {
        match self {
            Self::Invoice => Invoice::NAME,
            Self::Payment => Payment::NAME,
            Self::Vehicle => Vehicle::NAME,
            Self::Driver => Driver::NAME,
        }
    }
}

/// Cache subcommands
#[derive(Debug, Subcommand)]
pub enum CacheCommand {
    /// Delete cached entries of one entity type
    Purge {
        /// Entity type
        #[arg(long, value_enum)]
        entity: EntityKind,
        /// Only this tenant's natural keys and list pages
        #[arg(long)]
        company: Option<String>,
    },
}

/// Execute cache commands
pub async fn execute(args: &CacheArgs, cli: &Cli) -> Result<(), AppError> {
    let config = cli.load_config()?;
    let cache = CacheManager::new(&config.cache).await?;

    match &args.command {
        CacheCommand::Purge { entity, company } => {
            let removed = cache.purge(entity.name(), company.as_deref()).await?;
            let scope = company.as_deref().unwrap_or("all tenants");
            output::print_success(&format!(
                "Purged {removed} {} cache entries ({scope})",
                entity.name()
            ));
        }
    }

    Ok(())
}
