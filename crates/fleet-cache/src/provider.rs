//! Cache manager that dispatches to the configured provider.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use fleet_core::config::cache::CacheConfig;
use fleet_core::error::AppError;
use fleet_core::result::AppResult;
use fleet_core::traits::cache::CacheProvider;

use crate::keys;

/// Cache manager that wraps the configured cache provider.
///
/// The provider is selected at construction time based on configuration.
#[derive(Debug, Clone)]
pub struct CacheManager {
    /// The inner cache provider.
    inner: Arc<dyn CacheProvider>,
}

impl CacheManager {
    /// Create a new cache manager from configuration.
    pub async fn new(config: &CacheConfig) -> AppResult<Self> {
        let inner: Arc<dyn CacheProvider> = match config.provider.as_str() {
            #[cfg(feature = "redis-backend")]
            "redis" => {
                info!("Initializing Redis cache provider");
                let client = crate::redis::RedisClient::connect(&config.redis).await?;
                Arc::new(crate::redis::RedisCacheProvider::new(client))
            }
            #[cfg(feature = "memory")]
            "memory" => {
                info!(
                    max_capacity = config.memory.max_capacity,
                    "Initializing in-memory cache provider"
                );
                Arc::new(crate::memory::MemoryCacheProvider::new(&config.memory))
            }
            other => {
                return Err(AppError::configuration(format!(
                    "Unknown cache provider: '{other}'. Supported: memory, redis"
                )));
            }
        };

        Ok(Self { inner })
    }

    /// Create a cache manager from an existing provider (for testing).
    pub fn from_provider(provider: Arc<dyn CacheProvider>) -> Self {
        Self { inner: provider }
    }

    /// Get a reference to the inner provider.
    pub fn provider(&self) -> &dyn CacheProvider {
        self.inner.as_ref()
    }

    /// Delete cached entries of one entity type.
    ///
    /// With a company, only that tenant's natural keys, list pages and list
    /// ledger go; id keys are not tenant-scoped and stay until their TTL.
    /// Without one, every key of the entity type goes.
    pub async fn purge(&self, entity: &str, company_id: Option<&str>) -> AppResult<u64> {
        let removed = match company_id {
            Some(company) => {
                let tenant = self
                    .inner
                    .delete_pattern(&keys::tenant_pattern(entity, company))
                    .await?;
                let ledger = self
                    .inner
                    .delete_many(&[keys::list_ledger(entity, Some(company))])
                    .await?;
                tenant + ledger
            }
            None => self.inner.delete_pattern(&keys::entity_pattern(entity)).await?,
        };
        info!(entity, company_id, removed, "Purged cache entries");
        Ok(removed)
    }

    /// A shared handle to the inner provider, for cached repositories.
    pub fn shared(&self) -> Arc<dyn CacheProvider> {
        Arc::clone(&self.inner)
    }
}

#[async_trait]
impl CacheProvider for CacheManager {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()> {
        self.inner.set(key, value, ttl).await
    }

    async fn set_many(&self, entries: &[(String, String)], ttl: Duration) -> AppResult<()> {
        self.inner.set_many(entries, ttl).await
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.inner.delete(key).await
    }

    async fn delete_many(&self, keys: &[String]) -> AppResult<u64> {
        self.inner.delete_many(keys).await
    }

    async fn scan_keys(&self, pattern: &str) -> AppResult<Vec<String>> {
        self.inner.scan_keys(pattern).await
    }

    async fn delete_pattern(&self, pattern: &str) -> AppResult<u64> {
        self.inner.delete_pattern(pattern).await
    }

    async fn set_add(&self, key: &str, member: &str, ttl: Duration) -> AppResult<()> {
        self.inner.set_add(key, member, ttl).await
    }

    async fn set_take(&self, key: &str) -> AppResult<Vec<String>> {
        self.inner.set_take(key).await
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.inner.health_check().await
    }
}
