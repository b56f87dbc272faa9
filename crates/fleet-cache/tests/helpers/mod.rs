//! Shared fixtures for cache-aside integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use fleet_cache::memory::MemoryCacheProvider;
use fleet_cache::{CacheManager, CachedRepository};
use fleet_core::config::cache::{CacheConfig, ListInvalidation};
use fleet_core::error::AppError;
use fleet_core::result::AppResult;
use fleet_core::traits::{CacheProvider, Repository};
use fleet_core::types::{FilterSpec, Pagination, SortSpec};
use fleet_database::{
    DatabasePool, Entity, GenericRepository, RepositoryRegistry, RepositorySettings, Transactional,
};
use fleet_entity::{Invoice, InvoiceStatus, Payment, PaymentMethod};

/// Storage reads seen by a [`Counting`] repository.
#[derive(Debug, Default)]
pub struct Loads {
    pub gets: AtomicUsize,
    pub lists: AtomicUsize,
}

impl Loads {
    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn lists(&self) -> usize {
        self.lists.load(Ordering::SeqCst)
    }
}

/// A storage repository that counts how often it is read.
#[derive(Clone)]
pub struct Counting<T> {
    inner: GenericRepository<T>,
    pub loads: Arc<Loads>,
}

impl<T: Entity> Counting<T> {
    pub fn new(db: DatabasePool) -> Self {
        Self {
            inner: GenericRepository::new(db),
            loads: Arc::new(Loads::default()),
        }
    }
}

impl<T: Entity> Transactional<T> for Counting<T> {
    type Scoped = Counting<T>;

    fn run_in_transaction<F, Fut, R>(&self, f: F) -> impl Future<Output = AppResult<R>>
    where
        F: FnOnce(Self::Scoped) -> Fut,
        Fut: Future<Output = AppResult<R>>,
    {
        let loads = Arc::clone(&self.loads);
        self.inner.with_transaction(move |scoped| {
            f(Counting {
                inner: scoped,
                loads,
            })
        })
    }
}

#[async_trait]
impl<T: Entity> Repository<T> for Counting<T> {
    async fn create(&self, entity: &T) -> AppResult<()> {
        self.inner.create(entity).await
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<T> {
        self.loads.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get_by_id(id).await
    }

    async fn update(&self, entity: &T) -> AppResult<()> {
        self.inner.update(entity).await
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.inner.delete(id).await
    }

    async fn list_sorted(
        &self,
        filter: &FilterSpec,
        page: &Pagination,
        sort: &[SortSpec],
    ) -> AppResult<Vec<T>> {
        self.loads.lists.fetch_add(1, Ordering::SeqCst);
        self.inner.list_sorted(filter, page, sort).await
    }

    async fn count(&self, filter: &FilterSpec) -> AppResult<i64> {
        self.inner.count(filter).await
    }
}

/// A cache backend that is always down.
#[derive(Debug, Default)]
pub struct FailingCache;

fn down() -> AppError {
    AppError::connectivity("cache unreachable")
}

#[async_trait]
impl CacheProvider for FailingCache {
    async fn get(&self, _key: &str) -> AppResult<Option<String>> {
        Err(down())
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> AppResult<()> {
        Err(down())
    }

    async fn set_many(&self, _entries: &[(String, String)], _ttl: Duration) -> AppResult<()> {
        Err(down())
    }

    async fn delete(&self, _key: &str) -> AppResult<()> {
        Err(down())
    }

    async fn delete_many(&self, _keys: &[String]) -> AppResult<u64> {
        Err(down())
    }

    async fn scan_keys(&self, _pattern: &str) -> AppResult<Vec<String>> {
        Err(down())
    }

    async fn set_add(&self, _key: &str, _member: &str, _ttl: Duration) -> AppResult<()> {
        Err(down())
    }

    async fn set_take(&self, _key: &str) -> AppResult<Vec<String>> {
        Err(down())
    }

    async fn health_check(&self) -> AppResult<bool> {
        Err(down())
    }
}

/// A cached invoice repository over a registry's storage, so registry
/// transactions and cached reads see the same rows.
pub fn cached_registry() -> (RepositoryRegistry, CachedRepository<Invoice>) {
    let registry = RepositoryRegistry::with_settings(
        DatabasePool::memory(),
        RepositorySettings::default(),
    );
    let cache = CacheManager::from_provider(Arc::new(MemoryCacheProvider::default()));
    let repo = CachedRepository::new(
        registry.invoices().clone(),
        cache.shared(),
        &CacheConfig::default(),
    );
    (registry, repo)
}

pub struct Fixture<T> {
    pub repo: CachedRepository<T, Counting<T>>,
    pub cache: CacheManager,
    pub loads: Arc<Loads>,
}

/// A cached repository over fresh memory storage and a fresh memory cache.
pub fn cached<T: fleet_cache::Cacheable>(invalidation: ListInvalidation) -> Fixture<T> {
    let storage = Counting::<T>::new(DatabasePool::memory());
    let loads = Arc::clone(&storage.loads);
    let cache = CacheManager::from_provider(Arc::new(MemoryCacheProvider::default()));
    let config = CacheConfig {
        list_invalidation: invalidation,
        ..CacheConfig::default()
    };
    Fixture {
        repo: CachedRepository::new(storage, cache.shared(), &config),
        cache,
        loads,
    }
}

/// A cached repository whose cache backend always fails.
pub fn broken_cache<T: fleet_cache::Cacheable>() -> CachedRepository<T, Counting<T>> {
    CachedRepository::new(
        Counting::new(DatabasePool::memory()),
        Arc::new(FailingCache),
        &CacheConfig::default(),
    )
}

pub fn invoice(company: &str, n: u128) -> Invoice {
    let mut inv = Invoice::new(
        company,
        format!("INV-{n:03}"),
        format!("Customer {n}"),
        1_000 * n as i64,
        110 * n as i64,
    );
    inv.id = Uuid::from_u128(n);
    inv.status = InvoiceStatus::Issued;
    inv
}

pub fn payment(company: &str, n: u128) -> Payment {
    let mut pay = Payment::new(
        company,
        Uuid::from_u128(n),
        format!("PAY-{n:03}"),
        PaymentMethod::VirtualAccount,
        1_110 * n as i64,
    );
    pay.id = Uuid::from_u128(10_000 + n);
    pay
}

pub fn ids(invoices: &[Invoice]) -> Vec<u128> {
    invoices.iter().map(|i| i.id.as_u128()).collect()
}
