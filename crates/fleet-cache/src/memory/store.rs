//! In-memory cache implementation using the moka crate.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use moka::Expiry;
use moka::future::Cache;
use tracing::debug;

use fleet_core::config::cache::MemoryCacheConfig;
use fleet_core::result::AppResult;
use fleet_core::traits::cache::CacheProvider;

use crate::keys::glob_match;

/// A cached value together with the TTL it was written with.
#[derive(Debug, Clone)]
struct Entry {
    payload: Arc<str>,
    ttl: Duration,
}

/// Expires each entry after its own TTL.
struct PerEntryTtl;

impl Expiry<String, Entry> for PerEntryTtl {
    fn expire_after_create(&self, _key: &String, value: &Entry, _created_at: Instant) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

#[derive(Debug)]
struct SetEntry {
    members: BTreeSet<String>,
    expires_at: Instant,
}

impl SetEntry {
    fn is_live(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// In-memory cache provider using moka.
#[derive(Debug, Clone)]
pub struct MemoryCacheProvider {
    /// String values with per-entry expiry.
    cache: Cache<String, Entry>,
    /// Sets stored separately; moka values are immutable.
    sets: Arc<DashMap<String, SetEntry>>,
}

impl MemoryCacheProvider {
    /// Create a new in-memory cache from configuration.
    pub fn new(config: &MemoryCacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_capacity)
            .expire_after(PerEntryTtl)
            .build();

        Self {
            cache,
            sets: Arc::new(DashMap::new()),
        }
    }

    fn drop_set(&self, key: &str) -> bool {
        self.sets
            .remove(key)
            .is_some_and(|(_, entry)| entry.is_live())
    }
}

impl Default for MemoryCacheProvider {
    fn default() -> Self {
        Self::new(&MemoryCacheConfig::default())
    }
}

#[async_trait]
impl CacheProvider for MemoryCacheProvider {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.cache.get(key).await.map(|e| e.payload.to_string()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()> {
        let entry = Entry {
            payload: Arc::from(value),
            ttl,
        };
        self.cache.insert(key.to_string(), entry).await;
        Ok(())
    }

    async fn set_many(&self, entries: &[(String, String)], ttl: Duration) -> AppResult<()> {
        for (key, value) in entries {
            self.set(key, value, ttl).await?;
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.cache.remove(key).await;
        self.sets.remove(key);
        Ok(())
    }

    async fn delete_many(&self, keys: &[String]) -> AppResult<u64> {
        let mut count = 0u64;
        for key in keys {
            let value = self.cache.remove(key).await.is_some();
            let set = self.drop_set(key);
            if value || set {
                count += 1;
            }
        }
        Ok(count)
    }

    async fn scan_keys(&self, pattern: &str) -> AppResult<Vec<String>> {
        let mut keys: BTreeSet<String> = self
            .cache
            .iter()
            .filter(|(key, _)| glob_match(pattern, key))
            .map(|(key, _)| key.to_string())
            .collect();

        keys.extend(
            self.sets
                .iter()
                .filter(|entry| entry.is_live() && glob_match(pattern, entry.key()))
                .map(|entry| entry.key().clone()),
        );

        debug!(pattern, count = keys.len(), "Scanned memory cache");
        Ok(keys.into_iter().collect())
    }

    async fn set_add(&self, key: &str, member: &str, ttl: Duration) -> AppResult<()> {
        let expires_at = Instant::now() + ttl;
        let mut entry = self
            .sets
            .entry(key.to_string())
            .or_insert_with(|| SetEntry {
                members: BTreeSet::new(),
                expires_at,
            });
        if !entry.is_live() {
            entry.members.clear();
        }
        entry.members.insert(member.to_string());
        entry.expires_at = expires_at;
        Ok(())
    }

    async fn set_take(&self, key: &str) -> AppResult<Vec<String>> {
        Ok(match self.sets.remove(key) {
            Some((_, entry)) if entry.is_live() => entry.members.into_iter().collect(),
            _ => Vec::new(),
        })
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> MemoryCacheProvider {
        MemoryCacheProvider::default()
    }

    #[tokio::test]
    async fn test_set_get_delete() {
        let cache = provider();
        cache.set("invoice:1", "{}", Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.get("invoice:1").await.unwrap().as_deref(), Some("{}"));

        cache.delete("invoice:1").await.unwrap();
        assert!(cache.get("invoice:1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_entries_expire_after_their_own_ttl() {
        let cache = provider();
        cache.set("short", "a", Duration::from_millis(50)).await.unwrap();
        cache.set("long", "b", Duration::from_secs(60)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(120)).await;

        assert!(cache.get("short").await.unwrap().is_none());
        assert_eq!(cache.get("long").await.unwrap().as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn test_scan_and_delete_pattern() {
        let cache = provider();
        let ttl = Duration::from_secs(60);
        cache
            .set_many(
                &[
                    ("invoice:list:C1:aa".into(), "[]".into()),
                    ("invoice:list:C1:bb".into(), "[]".into()),
                    ("invoice:list:C10:cc".into(), "[]".into()),
                ],
                ttl,
            )
            .await
            .unwrap();

        let keys = cache.scan_keys("invoice:list:C1:*").await.unwrap();
        assert_eq!(keys, vec!["invoice:list:C1:aa", "invoice:list:C1:bb"]);

        assert_eq!(cache.delete_pattern("invoice:list:C1:*").await.unwrap(), 2);
        assert!(cache.get("invoice:list:C10:cc").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_many_counts_existing_keys() {
        let cache = provider();
        cache.set("a", "1", Duration::from_secs(60)).await.unwrap();
        cache.set_add("s", "x", Duration::from_secs(60)).await.unwrap();

        let removed = cache
            .delete_many(&["a".into(), "s".into(), "missing".into()])
            .await
            .unwrap();
        assert_eq!(removed, 2);
    }

    #[tokio::test]
    async fn test_set_add_and_take() {
        let cache = provider();
        let ttl = Duration::from_secs(60);
        cache.set_add("ledger", "k1", ttl).await.unwrap();
        cache.set_add("ledger", "k2", ttl).await.unwrap();
        cache.set_add("ledger", "k1", ttl).await.unwrap();

        assert_eq!(cache.set_take("ledger").await.unwrap(), vec!["k1", "k2"]);
        assert!(cache.set_take("ledger").await.unwrap().is_empty());
    }
}
