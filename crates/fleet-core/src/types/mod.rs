//! Query description types shared by the storage and cache layers.

pub mod filter;
pub mod pagination;
pub mod sorting;

pub use filter::{Condition, ConditionOp, DateRange, FilterSpec, FilterValue};
pub use pagination::{DEFAULT_LIMIT, Pagination, Window};
pub use sorting::{SortDirection, SortSpec};
