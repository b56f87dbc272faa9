//! In-process storage engine.
//!
//! Rows are stored as JSON objects and filtered with the same predicate tree
//! the PostgreSQL renderer consumes, so both engines answer a [`FilterSpec`]
//! identically. Used for tests and single-node development.
//!
//! [`FilterSpec`]: fleet_core::types::FilterSpec

mod eval;
mod store;

pub use store::MemoryStore;
pub(crate) use store::{MemoryTx, Tables, WriteOp};

use fleet_core::result::AppResult;

/// Where an in-process operation runs: directly on the store, or inside an
/// open transaction.
pub(crate) enum MemoryTarget<'a> {
    Store(&'a MemoryStore),
    Tx(&'a mut MemoryTx),
}

impl MemoryTarget<'_> {
    pub(crate) async fn read<R>(&self, f: impl FnOnce(&Tables) -> R) -> R {
        match self {
            Self::Store(store) => store.read(f).await,
            Self::Tx(tx) => tx.read(f),
        }
    }

    pub(crate) async fn write(
        &mut self,
        plan: impl FnOnce(&Tables) -> AppResult<Option<WriteOp>>,
    ) -> AppResult<bool> {
        match self {
            Self::Store(store) => store.write(plan).await,
            Self::Tx(tx) => tx.write(plan),
        }
    }
}
