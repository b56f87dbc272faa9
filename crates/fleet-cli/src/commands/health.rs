//! Storage and cache reachability check.

use serde::Serialize;
use tabled::Tabled;

use fleet_cache::CacheManager;
use fleet_core::config::AppConfig;
use fleet_core::error::AppError;
use fleet_core::traits::CacheProvider;
use fleet_database::DatabasePool;

use super::Cli;
use crate::output;

/// One row of the health report.
#[derive(Debug, Serialize, Tabled)]
struct ComponentStatus {
    component: &'static str,
    provider: String,
    status: String,
}

impl ComponentStatus {
    fn new(component: &'static str, provider: String, result: &Result<bool, AppError>) -> Self {
        let status = match result {
            Ok(true) => "up".to_string(),
            Ok(false) => "degraded".to_string(),
            Err(e) => format!("down: {e}"),
        };
        Self {
            component,
            provider,
            status,
        }
    }

    fn is_up(&self) -> bool {
        self.status == "up"
    }
}

/// Check storage and cache with `config`.
async fn check_components(config: &AppConfig) -> [ComponentStatus; 2] {
    // Connect without migrating; a health check never changes the schema.
    let storage = match DatabasePool::connect(&config.database).await {
        Ok(db) => {
            let result = db.health_check().await;
            db.close().await;
            result
        }
        Err(e) => Err(e),
    };
    let cache = match CacheManager::new(&config.cache).await {
        Ok(cache) => cache.health_check().await,
        Err(e) => Err(e),
    };

    [
        ComponentStatus::new(
            "storage",
            format!("{:?}", config.database.provider).to_lowercase(),
            &storage,
        ),
        ComponentStatus::new("cache", config.cache.provider.clone(), &cache),
    ]
}

/// Execute the health command
pub async fn execute(cli: &Cli) -> Result<(), AppError> {
    let config = cli.load_config()?;
    let report = check_components(&config).await;
    output::print_list(&report, cli.format);

    if report.iter().all(ComponentStatus::is_up) {
        Ok(())
    } else {
        Err(AppError::connectivity("one or more components are unhealthy"))
    }
}

#[cfg(test)]
mod tests {
    use fleet_core::config::StorageProvider;

    use super::*;

    fn in_process() -> AppConfig {
        let mut config = AppConfig::default();
        config.database.provider = StorageProvider::Memory;
        config.database.run_migrations = true;
        config.cache.provider = "memory".into();
        config
    }

    #[tokio::test]
    async fn test_check_reports_each_component() {
        let report = check_components(&in_process()).await;
        assert!(report.iter().all(ComponentStatus::is_up));
        assert_eq!(report[0].provider, "memory");
    }

    #[tokio::test]
    async fn test_check_marks_unknown_cache_down() {
        let mut config = in_process();
        config.cache.provider = "memcached".into();

        let report = check_components(&config).await;
        assert!(report[0].is_up());
        assert!(report[1].status.starts_with("down: "));
    }
}
