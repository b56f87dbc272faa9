//! Transaction scoping.
//!
//! A repository runs against an [`Executor`]: either the shared pool, where
//! each operation takes its own connection, or a [`TxScope`], where every
//! operation goes through the one open transaction. Scopes are created by
//! [`run_scoped`], which commits when the closure returns `Ok` and rolls back
//! otherwise. Dropping an uncommitted scope (for example when the caller's
//! future is cancelled) also rolls it back.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use sqlx::pool::PoolConnection;
use sqlx::{PgConnection, Postgres, Transaction};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, error};

use fleet_core::config::IsolationLevel;
use fleet_core::error::{AppError, ErrorKind};
use fleet_core::result::AppResult;

use crate::connection::{Backend, DatabasePool};
use crate::memory::{MemoryStore, MemoryTarget, MemoryTx};

pub(crate) enum TxState {
    Postgres(Transaction<'static, Postgres>),
    Memory(MemoryTx),
}

/// Handle to one open transaction. Clones share it.
#[derive(Clone)]
pub struct TxScope {
    state: Arc<Mutex<Option<TxState>>>,
}

impl fmt::Debug for TxScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TxScope").finish_non_exhaustive()
    }
}

impl TxScope {
    async fn begin(db: &DatabasePool, isolation: IsolationLevel) -> AppResult<Self> {
        let state = match db.backend() {
            Backend::Postgres(pool) => {
                let mut tx = pool
                    .begin()
                    .await
                    .map_err(|e| begin_error("Failed to begin transaction", e))?;
                let statement = format!("SET TRANSACTION ISOLATION LEVEL {}", isolation.as_sql());
                sqlx::query(&statement)
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| begin_error("Failed to set isolation level", e))?;
                TxState::Postgres(tx)
            }
            Backend::Memory(store) => TxState::Memory(store.begin().await),
        };
        debug!(isolation = isolation.as_sql(), "Transaction started");
        Ok(Self {
            state: Arc::new(Mutex::new(Some(state))),
        })
    }

    async fn commit(&self) -> AppResult<()> {
        match self.state.lock().await.take() {
            Some(TxState::Postgres(tx)) => tx
                .commit()
                .await
                .map_err(|e| end_error("Failed to commit transaction", e))?,
            Some(TxState::Memory(tx)) => {
                let writes = tx.commit().await;
                debug!(writes, "In-process transaction committed");
            }
            None => return Err(closed()),
        }
        Ok(())
    }

    async fn rollback(&self) -> AppResult<()> {
        match self.state.lock().await.take() {
            Some(TxState::Postgres(tx)) => tx
                .rollback()
                .await
                .map_err(|e| end_error("Failed to roll back transaction", e))?,
            Some(TxState::Memory(tx)) => drop(tx),
            None => return Err(closed()),
        }
        Ok(())
    }
}

/// Nothing has been written yet, so a lost connection is plain connectivity.
fn begin_error(message: &str, err: sqlx::Error) -> AppError {
    let kind = match &err {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed => ErrorKind::Connectivity,
        _ => ErrorKind::Transaction,
    };
    AppError::with_source(kind, format!("{message}: {err}"), err)
}

/// A failed COMMIT or ROLLBACK leaves the outcome unknown, whatever the cause.
fn end_error(message: &str, err: sqlx::Error) -> AppError {
    AppError::with_source(ErrorKind::Transaction, format!("{message}: {err}"), err)
}

fn closed() -> AppError {
    AppError::transaction("transaction scope is already closed")
}

/// What a repository executes against.
#[derive(Debug, Clone)]
pub enum Executor {
    /// Each operation checks out its own connection.
    Pool(DatabasePool),
    /// Every operation joins one open transaction.
    Scoped(TxScope),
}

impl Executor {
    pub fn is_transactional(&self) -> bool {
        matches!(self, Self::Scoped(_))
    }

    /// Check out what one operation needs.
    pub(crate) async fn session(&self) -> AppResult<Session<'_>> {
        match self {
            Self::Pool(db) => match db.backend() {
                Backend::Postgres(pool) => pool
                    .acquire()
                    .await
                    .map(Session::Pooled)
                    .map_err(|e| {
                        AppError::with_source(
                            ErrorKind::Connectivity,
                            format!("Failed to acquire connection: {e}"),
                            e,
                        )
                    }),
                Backend::Memory(store) => Ok(Session::Memory(store)),
            },
            Self::Scoped(scope) => Ok(Session::Scoped(scope.state.lock().await)),
        }
    }
}

/// A checked-out connection or a locked transaction, held for one operation.
pub(crate) enum Session<'a> {
    Pooled(PoolConnection<Postgres>),
    Memory(&'a MemoryStore),
    Scoped(MutexGuard<'a, Option<TxState>>),
}

/// The concrete engine an operation talks to.
pub(crate) enum Target<'s> {
    Postgres(&'s mut PgConnection),
    Memory(MemoryTarget<'s>),
}

impl Session<'_> {
    pub(crate) fn target(&mut self) -> AppResult<Target<'_>> {
        match self {
            Self::Pooled(conn) => Ok(Target::Postgres(&mut **conn)),
            Self::Memory(store) => Ok(Target::Memory(MemoryTarget::Store(*store))),
            Self::Scoped(guard) => match &mut **guard {
                Some(TxState::Postgres(tx)) => Ok(Target::Postgres(&mut **tx)),
                Some(TxState::Memory(tx)) => Ok(Target::Memory(MemoryTarget::Tx(tx))),
                None => Err(closed()),
            },
        }
    }
}

/// Run `f` inside a new transaction on `db`.
///
/// Commits when `f` returns `Ok`. Otherwise rolls back and returns `f`'s
/// error unchanged, unless the rollback itself fails, in which case a
/// `Transaction` error describing both is returned.
pub(crate) async fn run_scoped<F, Fut, R>(
    db: &DatabasePool,
    isolation: IsolationLevel,
    f: F,
) -> AppResult<R>
where
    F: FnOnce(TxScope) -> Fut,
    Fut: Future<Output = AppResult<R>>,
{
    let scope = TxScope::begin(db, isolation).await?;
    match f(scope.clone()).await {
        Ok(value) => {
            scope.commit().await?;
            debug!("Transaction committed");
            Ok(value)
        }
        Err(err) => match scope.rollback().await {
            Ok(()) => {
                debug!(error = %err, "Transaction rolled back");
                Err(err)
            }
            Err(rollback_err) => {
                error!(error = %err, rollback_error = %rollback_err, "Rollback failed");
                Err(AppError::transaction(format!(
                    "rollback failed ({}) after: {err}",
                    rollback_err.message
                )))
            }
        },
    }
}
