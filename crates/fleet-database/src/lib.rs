//! # fleet-database
//!
//! Storage access for the fleet platform: the connection handle (PostgreSQL
//! or the in-process engine), the filter compiler, the generic repository
//! with transaction scoping, and the registry that bundles a repository per
//! entity.

pub mod connection;
pub mod entity;
mod error;
pub mod memory;
pub mod migration;
pub mod query;
pub mod registry;
pub mod repositories;
pub mod repository;
pub mod transaction;

pub use connection::DatabasePool;
pub use entity::{Deletion, Entity};
pub use registry::{RepositoryRegistry, TransactionManager};
pub use repository::{GenericRepository, RepositorySettings, Transactional};
pub use transaction::{Executor, TxScope};
