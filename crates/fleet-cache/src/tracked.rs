//! Transaction-bound repositories that remember what they wrote.
//!
//! Inside a transaction the cache is bypassed: reads see uncommitted rows,
//! and invalidating before the commit would let a concurrent reader cache the
//! old state again. Writes are recorded in a [`WriteLog`] instead and
//! invalidated once the transaction has committed.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use fleet_core::result::AppResult;
use fleet_core::traits::Repository;
use fleet_core::types::{FilterSpec, Pagination, SortSpec};

use crate::cacheable::{Cacheable, natural_key_entry};

#[derive(Debug)]
struct Written<T> {
    entities: Vec<T>,
    ids: Vec<Uuid>,
}

/// Entities written through a [`TrackedRepository`]. Clones share the log.
#[derive(Debug)]
pub struct WriteLog<T> {
    written: Arc<Mutex<Written<T>>>,
}

impl<T> Clone for WriteLog<T> {
    fn clone(&self) -> Self {
        Self {
            written: Arc::clone(&self.written),
        }
    }
}

impl<T> Default for WriteLog<T> {
    fn default() -> Self {
        Self {
            written: Arc::new(Mutex::new(Written {
                entities: Vec::new(),
                ids: Vec::new(),
            })),
        }
    }
}

impl<T> WriteLog<T> {
    async fn record(&self, entity: T) {
        self.written.lock().await.entities.push(entity);
    }

    /// A delete of a row that was not found still drops its id key.
    async fn record_id(&self, id: Uuid) {
        self.written.lock().await.ids.push(id);
    }

    /// Drain the log: the written entities and the bare ids.
    pub(crate) async fn take(&self) -> (Vec<T>, Vec<Uuid>) {
        let mut written = self.written.lock().await;
        (
            std::mem::take(&mut written.entities),
            std::mem::take(&mut written.ids),
        )
    }

    pub async fn is_empty(&self) -> bool {
        let written = self.written.lock().await;
        written.entities.is_empty() && written.ids.is_empty()
    }
}

/// A transaction-bound repository whose writes are recorded for
/// invalidation after commit.
#[derive(Debug)]
pub struct TrackedRepository<T, S> {
    inner: S,
    log: WriteLog<T>,
}

impl<T, S: Clone> Clone for TrackedRepository<T, S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            log: self.log.clone(),
        }
    }
}

impl<T, S> TrackedRepository<T, S>
where
    T: Cacheable,
    S: Repository<T>,
{
    pub fn new(inner: S) -> Self {
        Self::with_log(inner, WriteLog::default())
    }

    pub fn with_log(inner: S, log: WriteLog<T>) -> Self {
        Self { inner, log }
    }

    /// The shared log of this repository's writes.
    pub fn log(&self) -> WriteLog<T> {
        self.log.clone()
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    async fn stored(&self, id: Uuid) -> AppResult<Option<T>> {
        match self.inner.get_by_id(id).await {
            Ok(found) => Ok(Some(found)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl<T, S> Repository<T> for TrackedRepository<T, S>
where
    T: Cacheable,
    S: Repository<T>,
{
    async fn create(&self, entity: &T) -> AppResult<()> {
        self.inner.create(entity).await?;
        self.log.record(entity.clone()).await;
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<T> {
        self.inner.get_by_id(id).await
    }

    async fn update(&self, entity: &T) -> AppResult<()> {
        let previous = match T::NATURAL_KEY {
            Some(_) => self.stored(entity.id()).await?,
            None => None,
        };

        self.inner.update(entity).await?;

        if let Some(old) = previous {
            let moved = natural_key_entry(&old) != natural_key_entry(entity)
                || old.tenant_id() != entity.tenant_id();
            if moved {
                self.log.record(old).await;
            }
        }
        self.log.record(entity.clone()).await;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let previous = self.stored(id).await?;
        self.inner.delete(id).await?;
        match previous {
            Some(old) => self.log.record(old).await,
            None => self.log.record_id(id).await,
        }
        Ok(())
    }

    async fn list_sorted(
        &self,
        filter: &FilterSpec,
        page: &Pagination,
        sort: &[SortSpec],
    ) -> AppResult<Vec<T>> {
        self.inner.list_sorted(filter, page, sort).await
    }

    async fn count(&self, filter: &FilterSpec) -> AppResult<i64> {
        self.inner.count(filter).await
    }
}
