//! Table storage and snapshot transactions for the in-process engine.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use fleet_core::error::AppError;
use fleet_core::result::AppResult;
use fleet_core::types::{SortSpec, Window};

use super::eval::{Row, matches, sort_rows};
use crate::entity::{Deletion, Entity};
use crate::query::Predicate;

/// A single staged mutation.
#[derive(Debug, Clone)]
pub(crate) enum WriteOp {
    Put {
        table: &'static str,
        id: Uuid,
        row: Row,
    },
    Remove {
        table: &'static str,
        id: Uuid,
    },
}

/// All tables, each keyed (and therefore ordered) by primary key.
#[derive(Debug, Clone, Default)]
pub(crate) struct Tables {
    tables: HashMap<&'static str, BTreeMap<Uuid, Row>>,
}

impl Tables {
    pub(crate) fn find<T: Entity>(&self, id: Uuid, scope: &Predicate) -> AppResult<Option<T>> {
        match self.tables.get(T::TABLE).and_then(|t| t.get(&id)) {
            Some(row) if matches(row, scope) => decode(row).map(Some),
            _ => Ok(None),
        }
    }

    pub(crate) fn select<T: Entity>(
        &self,
        predicate: &Predicate,
        window: Option<Window>,
        sort: &[SortSpec],
    ) -> AppResult<Vec<T>> {
        let Some(table) = self.tables.get(T::TABLE) else {
            return Ok(Vec::new());
        };

        let mut rows: Vec<&Row> = table.values().filter(|r| matches(r, predicate)).collect();
        sort_rows(&mut rows, sort);

        let (offset, limit) = match window {
            Some(w) => (
                w.offset_clause().unwrap_or(0),
                w.limit_clause().unwrap_or(i64::MAX),
            ),
            None => (0, i64::MAX),
        };
        let offset = usize::try_from(offset).unwrap_or(0);
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);

        rows.into_iter()
            .skip(offset)
            .take(limit)
            .map(decode)
            .collect()
    }

    pub(crate) fn count<T: Entity>(&self, predicate: &Predicate) -> i64 {
        self.tables.get(T::TABLE).map_or(0, |table| {
            table.values().filter(|r| matches(r, predicate)).count() as i64
        })
    }

    fn contains(&self, table: &str, id: &Uuid) -> bool {
        self.tables.get(table).is_some_and(|t| t.contains_key(id))
    }

    pub(crate) fn plan_insert<T: Entity>(&self, entity: &T) -> AppResult<Option<WriteOp>> {
        let id = entity.id();
        if self.contains(T::TABLE, &id) {
            return Err(AppError::conflict(format!("duplicate key {id}")));
        }
        self.plan_upsert(entity)
    }

    pub(crate) fn plan_upsert<T: Entity>(&self, entity: &T) -> AppResult<Option<WriteOp>> {
        Ok(Some(WriteOp::Put {
            table: T::TABLE,
            id: entity.id(),
            row: encode(entity)?,
        }))
    }

    pub(crate) fn plan_delete<T: Entity>(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Option<WriteOp>> {
        let Some(row) = self.tables.get(T::TABLE).and_then(|t| t.get(&id)) else {
            return Ok(None);
        };
        match T::DELETION {
            Deletion::Hard => Ok(Some(WriteOp::Remove { table: T::TABLE, id })),
            Deletion::Soft { column } => {
                if !row.get(column).is_none_or(Value::is_null) {
                    return Ok(None);
                }
                let mut row = row.clone();
                row.insert(column.to_string(), serde_json::to_value(now)?);
                Ok(Some(WriteOp::Put {
                    table: T::TABLE,
                    id,
                    row,
                }))
            }
        }
    }

    fn apply(&mut self, op: &WriteOp) {
        match op {
            WriteOp::Put { table, id, row } => {
                self.tables
                    .entry(*table)
                    .or_default()
                    .insert(*id, row.clone());
            }
            WriteOp::Remove { table, id } => {
                if let Some(t) = self.tables.get_mut(table) {
                    t.remove(id);
                }
            }
        }
    }
}

fn encode<T: Entity>(entity: &T) -> AppResult<Row> {
    match serde_json::to_value(entity)? {
        Value::Object(row) => Ok(row),
        _ => Err(AppError::internal(format!(
            "{} does not serialize to an object",
            T::NAME
        ))),
    }
}

fn decode<T: Entity>(row: &Row) -> AppResult<T> {
    Ok(serde_json::from_value(Value::Object(row.clone()))?)
}

/// In-process storage engine. Clones share the same tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) async fn read<R>(&self, f: impl FnOnce(&Tables) -> R) -> R {
        let tables = self.tables.read().await;
        f(&tables)
    }

    /// Plan and apply one mutation under a single write lock. Returns whether
    /// anything changed.
    pub(crate) async fn write(
        &self,
        plan: impl FnOnce(&Tables) -> AppResult<Option<WriteOp>>,
    ) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        match plan(&tables)? {
            Some(op) => {
                tables.apply(&op);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Open a transaction over a snapshot of the current tables.
    pub(crate) async fn begin(&self) -> MemoryTx {
        let working = self.tables.read().await.clone();
        MemoryTx {
            store: self.clone(),
            working,
            log: Vec::new(),
        }
    }
}

/// Snapshot-isolated transaction: reads see the snapshot plus the
/// transaction's own writes; nothing reaches the store until commit.
/// Dropping it discards the staged writes.
#[derive(Debug)]
pub(crate) struct MemoryTx {
    store: MemoryStore,
    working: Tables,
    log: Vec<WriteOp>,
}

impl MemoryTx {
    pub(crate) fn read<R>(&self, f: impl FnOnce(&Tables) -> R) -> R {
        f(&self.working)
    }

    pub(crate) fn write(
        &mut self,
        plan: impl FnOnce(&Tables) -> AppResult<Option<WriteOp>>,
    ) -> AppResult<bool> {
        match plan(&self.working)? {
            Some(op) => {
                self.working.apply(&op);
                self.log.push(op);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Replay the staged writes onto the live tables.
    pub(crate) async fn commit(self) -> usize {
        let mut tables = self.store.tables.write().await;
        for op in &self.log {
            tables.apply(op);
        }
        self.log.len()
    }
}

#[cfg(test)]
mod tests {
    use fleet_entity::Vehicle;

    use super::*;

    fn vehicle(n: u128) -> Vehicle {
        let mut v = Vehicle::new("C1", format!("B {n:04} XY"), "Isuzu", "Elf", 2019);
        v.id = Uuid::from_u128(n);
        v
    }

    async fn stored(store: &MemoryStore) -> i64 {
        store
            .read(|t| t.count::<Vehicle>(&Predicate::always()))
            .await
    }

    #[tokio::test]
    async fn test_transaction_writes_apply_only_on_commit() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await;
        assert!(tx.write(|t| t.plan_insert(&vehicle(1))).unwrap());
        assert!(tx.write(|t| t.plan_insert(&vehicle(2))).unwrap());

        assert_eq!(tx.read(|t| t.count::<Vehicle>(&Predicate::always())), 2);
        assert_eq!(stored(&store).await, 0);

        assert_eq!(tx.commit().await, 2);
        assert_eq!(stored(&store).await, 2);
    }

    #[tokio::test]
    async fn test_dropped_transaction_leaves_store_untouched() {
        let store = MemoryStore::new();
        {
            let mut tx = store.begin().await;
            tx.write(|t| t.plan_insert(&vehicle(1))).unwrap();
        }
        assert_eq!(stored(&store).await, 0);
    }

    #[tokio::test]
    async fn test_duplicate_insert_conflicts_inside_transaction() {
        let store = MemoryStore::new();
        store.write(|t| t.plan_insert(&vehicle(1))).await.unwrap();

        let mut tx = store.begin().await;
        let err = tx.write(|t| t.plan_insert(&vehicle(1))).unwrap_err();
        assert_eq!(err.kind, fleet_core::error::ErrorKind::Conflict);
    }
}
