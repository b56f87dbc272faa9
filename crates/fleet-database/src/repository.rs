//! Generic repository: CRUD, filtered listing and transaction scoping for
//! any [`Entity`].

use std::fmt;
use std::future::Future;
use std::marker::PhantomData;

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use fleet_core::config::{DatabaseConfig, IsolationLevel};
use fleet_core::context::RequestContext;
use fleet_core::error::AppError;
use fleet_core::result::AppResult;
use fleet_core::traits::Repository;
use fleet_core::types::{FilterSpec, Pagination, SortSpec};
use fleet_entity::clock;

use crate::connection::DatabasePool;
use crate::entity::{Deletion, Entity};
use crate::error::storage_error;
use crate::query::{DEFAULT_TENANT_COLUMN, Predicate, compile_with, sql};
use crate::transaction::{Executor, Target, run_scoped};

/// Behaviour switches shared by every repository built from one config.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepositorySettings {
    /// Reject list/count on tenant-scoped entities without a company id.
    pub require_tenant_scope: bool,
    /// Isolation level for transactions opened by this repository.
    pub isolation_level: IsolationLevel,
}

impl From<&DatabaseConfig> for RepositorySettings {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            require_tenant_scope: config.require_tenant_scope,
            isolation_level: config.isolation_level,
        }
    }
}

/// A repository that can run a closure against a transaction-bound copy of
/// itself. Lets wrappers such as the cache-aside accessor open a scope on
/// whatever storage repository they front.
pub trait Transactional<T: Entity>: Repository<T> {
    /// The repository type handed to the closure.
    type Scoped: Repository<T> + 'static;

    /// Commit when `f` returns `Ok`, roll back otherwise.
    fn run_in_transaction<F, Fut, R>(&self, f: F) -> impl Future<Output = AppResult<R>>
    where
        F: FnOnce(Self::Scoped) -> Fut,
        Fut: Future<Output = AppResult<R>>;
}

/// Repository for one entity type, bound to the pool or to an open
/// transaction.
pub struct GenericRepository<T> {
    exec: Executor,
    settings: RepositorySettings,
    ctx: Option<RequestContext>,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for GenericRepository<T> {
    fn clone(&self) -> Self {
        Self {
            exec: self.exec.clone(),
            settings: self.settings,
            ctx: self.ctx.clone(),
            _entity: PhantomData,
        }
    }
}

impl<T: Entity> fmt::Debug for GenericRepository<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenericRepository")
            .field("entity", &T::NAME)
            .field("exec", &self.exec)
            .field("settings", &self.settings)
            .finish()
    }
}

impl<T: Entity> GenericRepository<T> {
    /// Create a repository on the shared pool with default settings.
    pub fn new(db: DatabasePool) -> Self {
        Self::with_settings(db, RepositorySettings::default())
    }

    /// Create a repository on the shared pool.
    pub fn with_settings(db: DatabasePool, settings: RepositorySettings) -> Self {
        Self::bound(Executor::Pool(db), settings, None)
    }

    pub(crate) fn bound(
        exec: Executor,
        settings: RepositorySettings,
        ctx: Option<RequestContext>,
    ) -> Self {
        Self {
            exec,
            settings,
            ctx,
            _entity: PhantomData,
        }
    }

    /// A copy whose operations observe `ctx`'s cancellation and deadline.
    #[must_use]
    pub fn with_context(&self, ctx: RequestContext) -> Self {
        Self::bound(self.exec.clone(), self.settings, Some(ctx))
    }

    pub fn settings(&self) -> RepositorySettings {
        self.settings
    }

    /// Whether this instance runs inside a transaction.
    pub fn is_transactional(&self) -> bool {
        self.exec.is_transactional()
    }

    /// Run `f` with a transaction-bound copy of this repository.
    ///
    /// Commits if `f` returns `Ok`, rolls back and returns `f`'s error
    /// otherwise. Called on an instance that is already transactional, `f`
    /// joins the existing transaction and the outer caller decides its fate.
    pub async fn with_transaction<F, Fut, R>(&self, f: F) -> AppResult<R>
    where
        F: FnOnce(GenericRepository<T>) -> Fut,
        Fut: Future<Output = AppResult<R>>,
    {
        match &self.exec {
            Executor::Scoped(_) => self.guarded(f(self.clone())).await,
            Executor::Pool(db) => {
                let settings = self.settings;
                let ctx = self.ctx.clone();
                let scoped = run_scoped(db, settings.isolation_level, move |scope| {
                    f(Self::bound(Executor::Scoped(scope), settings, ctx))
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

    /// Extra predicate hiding soft-deleted rows.
    fn visibility() -> Predicate {
        match T::DELETION {
            Deletion::Soft { column } => Predicate::is_null(column),
            Deletion::Hard => Predicate::always(),
        }
    }

    fn filter_predicate(&self, op: &str, filter: &FilterSpec) -> AppResult<Predicate> {
        if self.settings.require_tenant_scope
            && T::TENANT_COLUMN.is_some()
            && filter.tenant().is_none()
        {
            return Err(AppError::validation(format!(
                "{op} {}: company_id is required",
                T::NAME
            )));
        }

        let tenant_column = T::TENANT_COLUMN.unwrap_or(DEFAULT_TENANT_COLUMN);
        let predicate = Predicate::and(vec![compile_with(filter, tenant_column), Self::visibility()]);
        check_fields::<T>(op, &predicate.fields())?;
        check_pattern_fields::<T>(op, &predicate.pattern_fields())?;
        Ok(predicate)
    }
}

fn check_fields<T: Entity>(op: &str, fields: &[&str]) -> AppResult<()> {
    for field in fields {
        if !T::has_column(field) {
            return Err(AppError::validation(format!(
                "{op} {}: unknown field '{field}'",
                T::NAME
            )));
        }
    }
    Ok(())
}

fn check_pattern_fields<T: Entity>(op: &str, fields: &[&str]) -> AppResult<()> {
    match fields.iter().find(|field| !T::is_text_column(field)) {
        Some(field) => Err(AppError::validation(format!(
            "{op} {}: pattern match on non-text field '{field}'",
            T::NAME
        ))),
        None => Ok(()),
    }
}

fn failed<T: Entity>(op: &'static str) -> impl Fn(AppError) -> AppError {
    move |e| e.context(format_args!("{op} {}", T::NAME))
}

impl<T: Entity> Transactional<T> for GenericRepository<T> {
    type Scoped = GenericRepository<T>;

    fn run_in_transaction<F, Fut, R>(&self, f: F) -> impl Future<Output = AppResult<R>>
    where
        F: FnOnce(Self::Scoped) -> Fut,
        Fut: Future<Output = AppResult<R>>,
    {
        self.with_transaction(f)
    }
}

#[async_trait]
impl<T: Entity> Repository<T> for GenericRepository<T> {
    async fn create(&self, entity: &T) -> AppResult<()> {
        self.guarded(async {
            let mut session = self.exec.session().await.map_err(failed::<T>("create"))?;
            match session.target().map_err(failed::<T>("create"))? {
                Target::Postgres(conn) => {
                    let mut qb = sql::insert(entity);
                    qb.build()
                        .execute(conn)
                        .await
                        .map_err(|e| storage_error("create", T::NAME, e))?;
                }
                Target::Memory(mut mem) => {
                    mem.write(|t| t.plan_insert(entity))
                        .await
                        .map_err(failed::<T>("create"))?;
                }
            }
            debug!(entity = T::NAME, id = %entity.id(), "Row created");
            Ok(())
        })
        .await
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<T> {
        self.guarded(async {
            let mut session = self.exec.session().await.map_err(failed::<T>("get"))?;
            let found = match session.target().map_err(failed::<T>("get"))? {
                Target::Postgres(conn) => {
                    let predicate =
                        Predicate::and(vec![Predicate::eq(T::PRIMARY_KEY, id), Self::visibility()]);
                    let mut qb = sql::select::<T>(&predicate, None, &[]);
                    qb.build_query_as::<T>()
                        .fetch_optional(conn)
                        .await
                        .map_err(|e| storage_error("get", T::NAME, e))?
                }
                Target::Memory(mem) => mem
                    .read(|t| t.find::<T>(id, &Self::visibility()))
                    .await
                    .map_err(failed::<T>("get"))?,
            };
            found.ok_or_else(|| AppError::not_found(format!("get {}: {id} not found", T::NAME)))
        })
        .await
    }

    async fn update(&self, entity: &T) -> AppResult<()> {
        self.guarded(async {
            let mut session = self.exec.session().await.map_err(failed::<T>("update"))?;
            match session.target().map_err(failed::<T>("update"))? {
                Target::Postgres(conn) => {
                    let mut qb = sql::upsert(entity);
                    qb.build()
                        .execute(conn)
                        .await
                        .map_err(|e| storage_error("update", T::NAME, e))?;
                }
                Target::Memory(mut mem) => {
                    mem.write(|t| t.plan_upsert(entity))
                        .await
                        .map_err(failed::<T>("update"))?;
                }
            }
            debug!(entity = T::NAME, id = %entity.id(), "Row saved");
            Ok(())
        })
        .await
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.guarded(async {
            let now = clock::now();
            let mut session = self.exec.session().await.map_err(failed::<T>("delete"))?;
            let affected = match session.target().map_err(failed::<T>("delete"))? {
                Target::Postgres(conn) => {
                    let mut qb = sql::delete::<T>(id, now);
                    qb.build()
                        .execute(conn)
                        .await
                        .map_err(|e| storage_error("delete", T::NAME, e))?
                        .rows_affected()
                        > 0
                }
                Target::Memory(mut mem) => mem
                    .write(|t| t.plan_delete::<T>(id, now))
                    .await
                    .map_err(failed::<T>("delete"))?,
            };
            debug!(entity = T::NAME, %id, affected, "Row deleted");
            Ok(())
        })
        .await
    }

    async fn list_sorted(
        &self,
        filter: &FilterSpec,
        page: &Pagination,
        sort: &[SortSpec],
    ) -> AppResult<Vec<T>> {
        self.guarded(async {
            let predicate = self.filter_predicate("list", filter)?;
            let sort_fields: Vec<&str> = sort.iter().map(|s| s.field.as_str()).collect();
            check_fields::<T>("list", &sort_fields)?;
            let window = page.resolve();

            let mut session = self.exec.session().await.map_err(failed::<T>("list"))?;
            match session.target().map_err(failed::<T>("list"))? {
                Target::Postgres(conn) => {
                    let mut qb = sql::select::<T>(&predicate, Some(window), sort);
                    qb.build_query_as::<T>()
                        .fetch_all(conn)
                        .await
                        .map_err(|e| storage_error("list", T::NAME, e))
                }
                Target::Memory(mem) => mem
                    .read(|t| t.select::<T>(&predicate, Some(window), sort))
                    .await
                    .map_err(failed::<T>("list")),
            }
        })
        .await
    }

    async fn count(&self, filter: &FilterSpec) -> AppResult<i64> {
        self.guarded(async {
            let predicate = self.filter_predicate("count", filter)?;

            let mut session = self.exec.session().await.map_err(failed::<T>("count"))?;
            match session.target().map_err(failed::<T>("count"))? {
                Target::Postgres(conn) => {
                    let mut qb = sql::count::<T>(&predicate);
                    qb.build_query_scalar::<i64>()
                        .fetch_one(conn)
                        .await
                        .map_err(|e| storage_error("count", T::NAME, e))
                }
                Target::Memory(mem) => Ok(mem.read(|t| t.count::<T>(&predicate)).await),
            }
        })
        .await
    }
}
