//! Generic repository trait for storage access.

use async_trait::async_trait;
use uuid::Uuid;

use crate::result::AppResult;
use crate::types::filter::FilterSpec;
use crate::types::pagination::Pagination;
use crate::types::sorting::SortSpec;

/// Per-entity CRUD plus filtered listing.
///
/// Implemented by the storage-backed generic repository and wrapped by the
/// cache-aside accessor. Transaction scoping is not part of this trait
/// because it is generic over the closure; concrete repositories expose it
/// as an inherent method.
#[async_trait]
pub trait Repository<T>: Send + Sync
where
    T: Send + Sync + 'static,
{
    /// Insert one row.
    async fn create(&self, entity: &T) -> AppResult<()>;

    /// Load one row; fails with `NotFound` when no row matches.
    async fn get_by_id(&self, id: Uuid) -> AppResult<T>;

    /// Write the full row keyed by primary key, inserting it if absent.
    async fn update(&self, entity: &T) -> AppResult<()>;

    /// Delete by id. Deleting a missing id succeeds.
    async fn delete(&self, id: Uuid) -> AppResult<()>;

    /// Filtered, paginated, sorted listing.
    async fn list_sorted(
        &self,
        filter: &FilterSpec,
        page: &Pagination,
        sort: &[SortSpec],
    ) -> AppResult<Vec<T>>;

    /// Filtered, paginated listing in storage-default order.
    async fn list(&self, filter: &FilterSpec, page: &Pagination) -> AppResult<Vec<T>> {
        self.list_sorted(filter, page, &[]).await
    }

    /// Number of rows matching `filter`, ignoring pagination.
    async fn count(&self, filter: &FilterSpec) -> AppResult<i64>;
}
