//! Application configuration schemas.
//!
//! All configuration structs are deserialized via the `config` crate from
//! TOML files plus environment overrides. Each sub-module represents a
//! logical configuration section.

pub mod cache;
pub mod database;
pub mod logging;

use serde::{Deserialize, Serialize};

pub use self::cache::{CacheConfig, CacheTtlConfig, ListInvalidation};
pub use self::database::{DatabaseConfig, IsolationLevel, StorageProvider};
pub use self::logging::LoggingConfig;

use crate::error::AppError;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Storage connection settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Cache provider settings.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration.
    ///
    /// Layers `path` (a TOML file, extension optional), then
    /// `config/{env}` when `env` is given, then environment variables
    /// prefixed with `FLEET_` using `__` as the section separator
    /// (`FLEET_DATABASE__URL`).
    pub fn load(path: &str, env: Option<&str>) -> Result<Self, AppError> {
        let mut builder =
            config::Config::builder().add_source(config::File::with_name(path).required(false));

        if let Some(env) = env {
            builder = builder
                .add_source(config::File::with_name(&format!("config/{env}")).required(false));
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix("FLEET")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = AppConfig::load("config/does-not-exist", None).expect("load");
        assert_eq!(config.cache.ttl.entity_seconds, 1800);
        assert_eq!(config.cache.ttl.list_seconds, 600);
        assert_eq!(config.cache.ttl.derived_seconds, 3600);
        assert_eq!(config.database.isolation_level, IsolationLevel::ReadCommitted);
        assert!(!config.database.require_tenant_scope);
    }

    #[test]
    fn test_deserialize_partial_toml() {
        let raw = r#"
            [database]
            provider = "memory"
            require_tenant_scope = true

            [cache]
            provider = "memory"
            list_invalidation = "ledger"

            [cache.ttl]
            list_seconds = 60
        "#;
        let config: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(raw, config::FileFormat::Toml))
            .build()
            .expect("build")
            .try_deserialize()
            .expect("deserialize");

        assert_eq!(config.database.provider, StorageProvider::Memory);
        assert!(config.database.require_tenant_scope);
        assert_eq!(config.cache.list_invalidation, ListInvalidation::Ledger);
        assert_eq!(config.cache.ttl.list_seconds, 60);
        assert_eq!(config.cache.ttl.entity_seconds, 1800);
    }
}
