//! # fleet-cache
//!
//! Cache layer for the fleet data-access core:
//!
//! - **memory**: in-process cache using [moka](https://crates.io/crates/moka)
//! - **redis**: Redis-backed cache using the [redis](https://crates.io/crates/redis) crate
//!
//! The provider is selected at runtime based on configuration. On top of it,
//! [`CachedRepository`] fronts any repository with read-through caching and
//! write invalidation.

pub mod accessor;
pub mod cacheable;
pub mod keys;
#[cfg(feature = "memory")]
pub mod memory;
pub mod provider;
#[cfg(feature = "redis-backend")]
pub mod redis;
pub mod tracked;

pub use accessor::{CacheTtls, CachedRepository};
pub use cacheable::Cacheable;
pub use provider::CacheManager;
pub use tracked::{TrackedRepository, WriteLog};
