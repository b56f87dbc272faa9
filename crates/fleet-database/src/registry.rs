//! Aggregated repositories sharing one storage handle, plus multi-repository
//! transactions.

use std::future::Future;

use fleet_core::config::{DatabaseConfig, IsolationLevel};
use fleet_core::context::RequestContext;
use fleet_core::result::AppResult;
use fleet_entity::{Driver, Invoice, Payment, Vehicle};

use crate::connection::DatabasePool;
use crate::entity::Entity;
use crate::repository::{GenericRepository, RepositorySettings};
use crate::transaction::{Executor, run_scoped};

/// One repository per entity, all bound to the same executor.
///
/// A registry handed to a [`RepositoryRegistry::transaction`] closure is
/// bound to that transaction, so every repository reached through it commits
/// or rolls back together.
#[derive(Debug, Clone)]
pub struct RepositoryRegistry {
    exec: Executor,
    settings: RepositorySettings,
    ctx: Option<RequestContext>,
    invoices: GenericRepository<Invoice>,
    payments: GenericRepository<Payment>,
    vehicles: GenericRepository<Vehicle>,
    drivers: GenericRepository<Driver>,
}

impl RepositoryRegistry {
    /// Build a registry on `db`, taking behaviour switches from `config`.
    pub fn new(db: DatabasePool, config: &DatabaseConfig) -> Self {
        Self::with_settings(db, RepositorySettings::from(config))
    }

    pub fn with_settings(db: DatabasePool, settings: RepositorySettings) -> Self {
        Self::bind(Executor::Pool(db), settings, None)
    }

    fn bind(exec: Executor, settings: RepositorySettings, ctx: Option<RequestContext>) -> Self {
        Self {
            invoices: GenericRepository::bound(exec.clone(), settings, ctx.clone()),
            payments: GenericRepository::bound(exec.clone(), settings, ctx.clone()),
            vehicles: GenericRepository::bound(exec.clone(), settings, ctx.clone()),
            drivers: GenericRepository::bound(exec.clone(), settings, ctx.clone()),
            exec,
            settings,
            ctx,
        }
    }

    pub fn invoices(&self) -> &GenericRepository<Invoice> {
        &self.invoices
    }

    pub fn payments(&self) -> &GenericRepository<Payment> {
        &self.payments
    }

    pub fn vehicles(&self) -> &GenericRepository<Vehicle> {
        &self.vehicles
    }

    pub fn drivers(&self) -> &GenericRepository<Driver> {
        &self.drivers
    }

    /// A repository for any entity, bound like the others.
    pub fn repository<T: Entity>(&self) -> GenericRepository<T> {
        GenericRepository::bound(self.exec.clone(), self.settings, self.ctx.clone())
    }

    /// A copy whose repositories observe `ctx`.
    #[must_use]
    pub fn with_context(&self, ctx: RequestContext) -> Self {
        Self::bind(self.exec.clone(), self.settings, Some(ctx))
    }

    /// Whether this registry is bound to an open transaction.
    pub fn is_transactional(&self) -> bool {
        self.exec.is_transactional()
    }

    /// The transaction manager for this registry.
    pub fn transactions(&self) -> TransactionManager {
        TransactionManager {
            exec: self.exec.clone(),
            settings: self.settings,
            ctx: self.ctx.clone(),
        }
    }

    /// Run `f` in one transaction at the configured isolation level.
    pub async fn transaction<F, Fut, R>(&self, f: F) -> AppResult<R>
    where
        F: FnOnce(RepositoryRegistry) -> Fut,
        Fut: Future<Output = AppResult<R>>,
    {
        self.transactions().run(f).await
    }

    /// Check that the underlying storage answers.
    pub async fn health_check(&self) -> AppResult<bool> {
        match &self.exec {
            Executor::Pool(db) => db.health_check().await,
            Executor::Scoped(_) => Ok(true),
        }
    }
}

/// Wraps multi-repository operations in a single atomic scope.
#[derive(Debug, Clone)]
pub struct TransactionManager {
    exec: Executor,
    settings: RepositorySettings,
    ctx: Option<RequestContext>,
}

impl TransactionManager {
    /// Run `f` at the configured isolation level.
    pub async fn run<F, Fut, R>(&self, f: F) -> AppResult<R>
    where
        F: FnOnce(RepositoryRegistry) -> Fut,
        Fut: Future<Output = AppResult<R>>,
    {
        self.run_with(self.settings.isolation_level, f).await
    }

    /// Run `f` at `isolation`.
    ///
    /// `f` receives a registry bound to the new transaction. If this manager
    /// already belongs to a transaction, `f` joins it instead and `isolation`
    /// is ignored.
    pub async fn run_with<F, Fut, R>(&self, isolation: IsolationLevel, f: F) -> AppResult<R>
    where
        F: FnOnce(RepositoryRegistry) -> Fut,
        Fut: Future<Output = AppResult<R>>,
    {
        let settings = self.settings;
        let ctx = self.ctx.clone();
        match &self.exec {
            Executor::Scoped(_) => {
                let registry = RepositoryRegistry::bind(self.exec.clone(), settings, ctx);
                self.guarded(f(registry)).await
            }
            Executor::Pool(db) => {
                let scoped = run_scoped(db, isolation, move |scope| {
                    f(RepositoryRegistry::bind(Executor::Scoped(scope), settings, ctx))
                });
                self.guarded(scoped).await
            }
        }
    }

    async fn guarded<R>(&self, fut: impl Future<Output = AppResult<R>>) -> AppResult<R> {
        match &self.ctx {
            Some(ctx) => ctx.run(fut).await,
            None => fut.await,
        }
    }
}
