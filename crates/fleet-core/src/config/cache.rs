//! Cache provider configuration.

use serde::{Deserialize, Serialize};

/// How stale list pages are found when an entity changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListInvalidation {
    /// Scan the key space for the tenant's list keys.
    #[default]
    Scan,
    /// Track issued list keys in a per-tenant set and delete its members.
    Ledger,
}

/// Top-level cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cache provider type: `"memory"` or `"redis"`.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Redis-specific cache configuration.
    #[serde(default)]
    pub redis: RedisCacheConfig,
    /// In-memory cache configuration.
    #[serde(default)]
    pub memory: MemoryCacheConfig,
    /// Per-category TTLs.
    #[serde(default)]
    pub ttl: CacheTtlConfig,
    /// List-key invalidation strategy.
    #[serde(default)]
    pub list_invalidation: ListInvalidation,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            redis: RedisCacheConfig::default(),
            memory: MemoryCacheConfig::default(),
            ttl: CacheTtlConfig::default(),
            list_invalidation: ListInvalidation::default(),
        }
    }
}

/// Redis cache backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisCacheConfig {
    /// Redis connection URL.
    #[serde(default = "default_redis_url")]
    pub url: String,
    /// Key prefix for all cache keys written by this process.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    /// `COUNT` hint passed to `SCAN`.
    #[serde(default = "default_scan_batch")]
    pub scan_batch: usize,
}

impl Default for RedisCacheConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            key_prefix: default_key_prefix(),
            scan_batch: default_scan_batch(),
        }
    }
}

/// In-memory cache backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryCacheConfig {
    /// Maximum number of entries in the cache.
    #[serde(default = "default_max_capacity")]
    pub max_capacity: u64,
}

impl Default for MemoryCacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: default_max_capacity(),
        }
    }
}

/// TTLs by volatility of the cached data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheTtlConfig {
    /// Single entities looked up by id or natural key.
    #[serde(default = "default_entity_ttl")]
    pub entity_seconds: u64,
    /// List pages keyed by query signature.
    #[serde(default = "default_list_ttl")]
    pub list_seconds: u64,
    /// Derived, slow-changing data such as payment instructions.
    #[serde(default = "default_derived_ttl")]
    pub derived_seconds: u64,
}

impl Default for CacheTtlConfig {
    fn default() -> Self {
        Self {
            entity_seconds: default_entity_ttl(),
            list_seconds: default_list_ttl(),
            derived_seconds: default_derived_ttl(),
        }
    }
}

fn default_provider() -> String {
    "memory".to_string()
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_key_prefix() -> String {
    "fleet:".to_string()
}

fn default_scan_batch() -> usize {
    500
}

fn default_max_capacity() -> u64 {
    10000
}

fn default_entity_ttl() -> u64 {
    30 * 60
}

fn default_list_ttl() -> u64 {
    10 * 60
}

fn default_derived_ttl() -> u64 {
    60 * 60
}
