//! # fleet-core
//!
//! Core crate for the fleet data-access layer. Contains the repository and
//! cache traits, configuration schemas, filter/pagination/sorting types,
//! the request context used for cancellation, and the unified error system.
//!
//! This crate has **no** internal dependencies on other fleet crates.

pub mod config;
pub mod context;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use context::RequestContext;
pub use error::{AppError, ErrorKind};
pub use result::AppResult;
