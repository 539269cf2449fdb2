//! Cache provider trait for pluggable caching backends.

use std::time::Duration;

use async_trait::async_trait;

use crate::result::AppResult;

/// Trait for cache backends (Redis, in-memory, or disabled).
///
/// All values are stored as strings (JSON or decimal integers). Every entry
/// carries its own TTL; a `None` TTL keeps the entry until it is deleted or
/// evicted. Implementations report unreachable backends as
/// [`ErrorKind::Cache`](crate::ErrorKind::Cache) so callers can degrade.
#[async_trait]
pub trait CacheProvider: Send + Sync + std::fmt::Debug + 'static {
    /// Get a value by key. Returns `None` if the key does not exist or has expired.
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// Set a value with an optional TTL.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> AppResult<()>;

    /// Delete a key from the cache.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Check whether a key exists in the cache.
    async fn exists(&self, key: &str) -> AppResult<bool>;

    /// Check that the cache backend is reachable.
    async fn health_check(&self) -> AppResult<bool>;

    /// Short backend name used in logs and health output.
    fn name(&self) -> &'static str;
}
