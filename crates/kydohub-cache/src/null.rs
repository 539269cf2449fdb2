//! Disabled cache provider.

use std::time::Duration;

use async_trait::async_trait;

use kydohub_core::result::AppResult;
use kydohub_core::traits::cache::CacheProvider;

/// Provider used when caching is turned off. Every read misses and every
/// write is dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullCacheProvider;

#[async_trait]
impl CacheProvider for NullCacheProvider {
    async fn get(&self, _key: &str) -> AppResult<Option<String>> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: Option<Duration>) -> AppResult<()> {
        Ok(())
    }

    async fn delete(&self, _key: &str) -> AppResult<()> {
        Ok(())
    }

    async fn exists(&self, _key: &str) -> AppResult<bool> {
        Ok(false)
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }

    fn name(&self) -> &'static str {
        "none"
    }
}
