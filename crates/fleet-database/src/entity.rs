//! Table metadata a type must provide to be stored by the generic repository.

use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::postgres::PgRow;
use sqlx::query_builder::Separated;
use sqlx::{FromRow, Postgres};
use uuid::Uuid;

/// How `delete` removes a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deletion {
    /// The row is removed.
    Hard,
    /// The row stays, with `column` set to the deletion time. Soft-deleted
    /// rows are invisible to reads.
    Soft { column: &'static str },
}

/// A persisted entity.
///
/// `COLUMNS` is the full column list in insert order and doubles as the
/// whitelist for filter and sort fields. `bind_row` must push one bind per
/// column, in the same order.
pub trait Entity:
    Serialize
    + DeserializeOwned
    + for<'r> FromRow<'r, PgRow>
    + Clone
    + Send
    + Sync
    + Unpin
    + 'static
{
    /// Short lowercase name used in logs, errors and cache keys.
    const NAME: &'static str;
    const TABLE: &'static str;
    const COLUMNS: &'static [&'static str];
    /// Columns stored as `TEXT`, the only ones pattern matching applies to.
    const TEXT_COLUMNS: &'static [&'static str];
    const PRIMARY_KEY: &'static str = "id";
    /// Column holding the tenant id, if the entity is tenant-scoped.
    const TENANT_COLUMN: Option<&'static str> = Some("company_id");
    const DELETION: Deletion = Deletion::Hard;

    fn id(&self) -> Uuid;

    fn tenant_id(&self) -> Option<&str>;

    /// Push this row's values, one bind per entry in `COLUMNS`.
    fn bind_row(&self, row: &mut Separated<'_, '_, Postgres, &'static str>);

    fn has_column(name: &str) -> bool {
        Self::COLUMNS.contains(&name)
    }

    fn is_text_column(name: &str) -> bool {
        Self::TEXT_COLUMNS.contains(&name)
    }
}
