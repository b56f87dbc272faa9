//! Cache-aside repository wrapper.
//!
//! Reads consult the cache first and populate it on a miss. Writes go to
//! storage first and then invalidate every key that may hold the old
//! state: the id key, the natural key, derived keys, and the list pages of
//! the entity's tenant. Cache failures are logged and never surface to
//! callers; storage stays the source of truth.

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use uuid::Uuid;

use fleet_core::config::cache::{CacheConfig, CacheTtlConfig, ListInvalidation};
use fleet_core::error::AppError;
use fleet_core::result::AppResult;
use fleet_core::traits::{CacheProvider, Repository};
use fleet_core::types::{FilterSpec, Pagination, SortSpec};
use fleet_database::{GenericRepository, Transactional};
use fleet_entity::{Payment, PaymentInstruction};

use crate::cacheable::{Cacheable, natural_key_entry};
use crate::keys;
use crate::tracked::{TrackedRepository, WriteLog};

/// TTLs by data volatility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtls {
    pub entity: Duration,
    pub list: Duration,
    pub derived: Duration,
}

impl From<&CacheTtlConfig> for CacheTtls {
    fn from(config: &CacheTtlConfig) -> Self {
        Self {
            entity: Duration::from_secs(config.entity_seconds),
            list: Duration::from_secs(config.list_seconds),
            derived: Duration::from_secs(config.derived_seconds),
        }
    }
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self::from(&CacheTtlConfig::default())
    }
}

/// A repository fronted by the cache.
///
/// Transactional writes go through [`CachedRepository::with_transaction`], or,
/// for transactions spanning several entities, through repositories from
/// [`CachedRepository::track`] whose log is handed to
/// [`CachedRepository::invalidate_written`] after the commit.
pub struct CachedRepository<T, R = GenericRepository<T>> {
    inner: R,
    cache: Arc<dyn CacheProvider>,
    ttls: CacheTtls,
    invalidation: ListInvalidation,
    _entity: PhantomData<fn() -> T>,
}

impl<T, R: Clone> Clone for CachedRepository<T, R> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            cache: Arc::clone(&self.cache),
            ttls: self.ttls,
            invalidation: self.invalidation,
            _entity: PhantomData,
        }
    }
}

impl<T: Cacheable, R> std::fmt::Debug for CachedRepository<T, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedRepository")
            .field("entity", &T::NAME)
            .field("cache", &self.cache)
            .field("ttls", &self.ttls)
            .field("invalidation", &self.invalidation)
            .finish_non_exhaustive()
    }
}

impl<T, R> CachedRepository<T, R>
where
    T: Cacheable,
    R: Repository<T>,
{
    /// Front `inner` with `cache`, taking TTLs and the list invalidation
    /// strategy from `config`.
    pub fn new(inner: R, cache: Arc<dyn CacheProvider>, config: &CacheConfig) -> Self {
        Self {
            inner,
            cache,
            ttls: CacheTtls::from(&config.ttl),
            invalidation: config.list_invalidation,
            _entity: PhantomData,
        }
    }

    #[must_use]
    pub fn with_ttls(mut self, ttls: CacheTtls) -> Self {
        self.ttls = ttls;
        self
    }

    #[must_use]
    pub fn with_invalidation(mut self, invalidation: ListInvalidation) -> Self {
        self.invalidation = invalidation;
        self
    }

    /// The wrapped repository, bypassing the cache.
    pub fn inner(&self) -> &R {
        &self.inner
    }

    pub fn ttls(&self) -> CacheTtls {
        self.ttls
    }

    /// Look up by natural key within one tenant.
    pub async fn get_by_natural_key(&self, company_id: &str, value: &str) -> AppResult<T> {
        let column = T::NATURAL_KEY.ok_or_else(|| {
            AppError::validation(format!("{} has no natural key", T::NAME))
        })?;
        let key = keys::entity_by_natural_key(T::NAME, column, Some(company_id), value);

        if let Some(hit) = self.read::<T>(&key).await {
            return Ok(hit);
        }

        let filter = FilterSpec::for_company(company_id).eq(column, value);
        let found = self
            .inner
            .list(&filter, &Pagination::window(0, 1))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                AppError::not_found(format!("get {}: {column} '{value}' not found", T::NAME))
            })?;

        self.remember(std::slice::from_ref(&found)).await;
        Ok(found)
    }

    /// Read-through for values that are not entities.
    ///
    /// A loader error is returned as is and nothing is cached.
    pub async fn get_or_load<V, F, Fut>(&self, key: &str, ttl: Duration, loader: F) -> AppResult<V>
    where
        V: Serialize + DeserializeOwned + Send,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = AppResult<V>> + Send,
    {
        if let Some(hit) = self.read::<V>(key).await {
            return Ok(hit);
        }

        let value = loader().await?;
        if let Some(payload) = self.encode(key, &value) {
            self.write(vec![(key.to_string(), payload)], ttl).await;
        }
        Ok(value)
    }

    /// Drop every cache entry that may reflect `entity`'s old state.
    pub async fn invalidate(&self, entity: &T) {
        let mut stale = vec![keys::entity_by_id(T::NAME, entity.id())];
        stale.extend(natural_key_entry(entity));
        stale.extend(entity.derived_keys());
        self.forget(&stale).await;

        self.invalidate_lists(entity.tenant_id()).await;
        if entity.tenant_id().is_some_and(|t| !t.is_empty()) {
            self.invalidate_lists(None).await;
        }
    }

    /// Record writes made through `scoped`, a repository bound to an open
    /// transaction.
    pub fn track<S: Repository<T>>(&self, scoped: S) -> TrackedRepository<T, S> {
        TrackedRepository::new(scoped)
    }

    /// Invalidate everything recorded in `log`, draining it. Call after the
    /// transaction that produced it has committed.
    pub async fn invalidate_written(&self, log: &WriteLog<T>) {
        let (entities, ids) = log.take().await;
        if !ids.is_empty() {
            let stale: Vec<String> = ids
                .into_iter()
                .map(|id| keys::entity_by_id(T::NAME, id))
                .collect();
            self.forget(&stale).await;
        }
        for entity in &entities {
            self.invalidate(entity).await;
        }
    }

    /// Drop the cached list pages of one tenant (`None` for unscoped lists).
    pub async fn invalidate_lists(&self, tenant: Option<&str>) {
        let result = match self.invalidation {
            ListInvalidation::Scan => {
                self.cache
                    .delete_pattern(&keys::list_pattern(T::NAME, tenant))
                    .await
            }
            ListInvalidation::Ledger => {
                let ledger = keys::list_ledger(T::NAME, tenant);
                match self.cache.set_take(&ledger).await {
                    Ok(pages) if pages.is_empty() => Ok(0),
                    Ok(pages) => self.cache.delete_many(&pages).await,
                    Err(e) => Err(e),
                }
            }
        };

        match result {
            Ok(count) => debug!(
                entity = T::NAME,
                company_id = keys::tenant_segment(tenant),
                count,
                "Invalidated cached list pages"
            ),
            Err(e) => warn!(
                entity = T::NAME,
                company_id = keys::tenant_segment(tenant),
                error = %e,
                "Failed to invalidate cached list pages"
            ),
        }
    }

    /// The current stored row, used to find keys an update or delete makes stale.
    async fn previous(&self, id: Uuid) -> AppResult<Option<T>> {
        if let Some(hit) = self.read::<T>(&keys::entity_by_id(T::NAME, id)).await {
            return Ok(Some(hit));
        }
        match self.inner.get_by_id(id).await {
            Ok(found) => Ok(Some(found)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Cache each entity under its id and natural key in one batch.
    async fn remember(&self, entities: &[T]) {
        let mut entries = Vec::with_capacity(entities.len() * 2);
        for entity in entities {
            let id_key = keys::entity_by_id(T::NAME, entity.id());
            let Some(payload) = self.encode(&id_key, entity) else {
                continue;
            };
            if let Some(natural) = natural_key_entry(entity) {
                entries.push((natural, payload.clone()));
            }
            entries.push((id_key, payload));
        }
        self.write(entries, self.ttls.entity).await;
    }

    async fn read<V: DeserializeOwned>(&self, key: &str) -> Option<V> {
        match self.cache.get(key).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => {
                    debug!(entity = T::NAME, key, "Cache hit");
                    Some(value)
                }
                Err(e) => {
                    warn!(entity = T::NAME, key, error = %e, "Discarding undecodable cache entry");
                    self.forget(&[key.to_string()]).await;
                    None
                }
            },
            Ok(None) => {
                debug!(entity = T::NAME, key, "Cache miss");
                None
            }
            Err(e) => {
                warn!(entity = T::NAME, key, error = %e, "Cache read failed");
                None
            }
        }
    }

    async fn write(&self, entries: Vec<(String, String)>, ttl: Duration) {
        if entries.is_empty() {
            return;
        }
        if let Err(e) = self.cache.set_many(&entries, ttl).await {
            warn!(entity = T::NAME, count = entries.len(), error = %e, "Cache write failed");
        }
    }

    async fn forget(&self, stale: &[String]) {
        if let Err(e) = self.cache.delete_many(stale).await {
            warn!(entity = T::NAME, count = stale.len(), error = %e, "Cache delete failed");
        }
    }

    fn encode<V: Serialize + ?Sized>(&self, key: &str, value: &V) -> Option<String> {
        match serde_json::to_string(value) {
            Ok(payload) => Some(payload),
            Err(e) => {
                warn!(entity = T::NAME, key, error = %e, "Failed to encode cache entry");
                None
            }
        }
    }
}

impl<T, R> CachedRepository<T, R>
where
    T: Cacheable,
    R: Transactional<T>,
{
    /// Run `f` in a transaction on the wrapped repository.
    ///
    /// `f` gets a transaction-bound repository that bypasses the cache.
    /// Every entity it writes is invalidated once the commit succeeds; on
    /// rollback the cache is left alone.
    pub async fn with_transaction<F, Fut, V>(&self, f: F) -> AppResult<V>
    where
        F: FnOnce(TrackedRepository<T, R::Scoped>) -> Fut,
        Fut: Future<Output = AppResult<V>>,
    {
        let log = WriteLog::default();
        let recorder = log.clone();
        let value = self
            .inner
            .run_in_transaction(move |scoped| f(TrackedRepository::with_log(scoped, recorder)))
            .await?;
        self.invalidate_written(&log).await;
        Ok(value)
    }
}

impl<R: Repository<Payment>> CachedRepository<Payment, R> {
    /// Payment instructions, built by `build` on a miss and cached with the
    /// derived-data TTL. Dropped whenever the payment changes.
    pub async fn instructions<F, Fut>(&self, payment_id: Uuid, build: F) -> AppResult<PaymentInstruction>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = AppResult<PaymentInstruction>> + Send,
    {
        let key = keys::payment_instructions(payment_id);
        self.get_or_load(&key, self.ttls.derived, build).await
    }
}

#[async_trait]
impl<T, R> Repository<T> for CachedRepository<T, R>
where
    T: Cacheable,
    R: Repository<T>,
{
    async fn create(&self, entity: &T) -> AppResult<()> {
        self.inner.create(entity).await?;
        self.invalidate(entity).await;
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<T> {
        let key = keys::entity_by_id(T::NAME, id);
        if let Some(hit) = self.read::<T>(&key).await {
            return Ok(hit);
        }

        let found = self.inner.get_by_id(id).await?;
        self.remember(std::slice::from_ref(&found)).await;
        Ok(found)
    }

    async fn update(&self, entity: &T) -> AppResult<()> {
        let previous = match T::NATURAL_KEY {
            Some(_) => self.previous(entity.id()).await?,
            None => None,
        };

        self.inner.update(entity).await?;
        self.invalidate(entity).await;

        if let Some(old) = previous {
            let moved = natural_key_entry(&old) != natural_key_entry(entity)
                || old.tenant_id() != entity.tenant_id();
            if moved {
                self.invalidate(&old).await;
            }
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let previous = self.previous(id).await?;
        self.inner.delete(id).await?;

        match previous {
            Some(old) => self.invalidate(&old).await,
            None => self.forget(&[keys::entity_by_id(T::NAME, id)]).await,
        }
        Ok(())
    }

    async fn list_sorted(
        &self,
        filter: &FilterSpec,
        page: &Pagination,
        sort: &[SortSpec],
    ) -> AppResult<Vec<T>> {
        let key = match keys::list_signature(filter, page.resolve(), sort) {
            Ok(signature) => keys::list(T::NAME, filter.tenant(), &signature),
            Err(e) => {
                warn!(entity = T::NAME, error = %e, "Cannot sign list query, bypassing cache");
                return self.inner.list_sorted(filter, page, sort).await;
            }
        };

        if let Some(hit) = self.read::<Vec<T>>(&key).await {
            return Ok(hit);
        }

        let rows = self.inner.list_sorted(filter, page, sort).await?;

        if let Some(payload) = self.encode(&key, &rows) {
            self.write(vec![(key.clone(), payload)], self.ttls.list).await;
            if self.invalidation == ListInvalidation::Ledger {
                let ledger = keys::list_ledger(T::NAME, filter.tenant());
                if let Err(e) = self.cache.set_add(&ledger, &key, self.ttls.list).await {
                    warn!(entity = T::NAME, key, error = %e, "Failed to record list page");
                }
            }
        }
        self.remember(&rows).await;

        Ok(rows)
    }

    async fn count(&self, filter: &FilterSpec) -> AppResult<i64> {
        self.inner.count(filter).await
    }
}
