//! Filter compilation and SQL rendering.

pub mod compiler;
pub mod predicate;
pub(crate) mod sql;

pub use compiler::{DEFAULT_TENANT_COLUMN, compile, compile_with};
pub use predicate::{CompareOp, Predicate};
