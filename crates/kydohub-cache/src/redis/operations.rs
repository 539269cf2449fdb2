//! Redis cache provider implementation.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;

use kydohub_core::error::{AppError, ErrorKind};
use kydohub_core::result::AppResult;
use kydohub_core::traits::cache::CacheProvider;

use super::client::RedisClient;

/// Redis-backed cache provider.
#[derive(Debug, Clone)]
pub struct RedisCacheProvider {
    /// Redis client.
    client: RedisClient,
}

impl RedisCacheProvider {
    /// Create a new Redis cache provider.
    pub fn new(client: RedisClient) -> Self {
        Self { client }
    }

    /// Map a Redis error to an AppError.
    fn map_err(e: redis::RedisError) -> AppError {
        AppError::with_source(ErrorKind::Cache, format!("Redis error: {e}"), e)
    }

    /// Run one command, failing with a cache error when Redis is slow.
    async fn bounded<T>(
        &self,
        op: impl Future<Output = redis::RedisResult<T>>,
    ) -> AppResult<T> {
        match tokio::time::timeout(self.client.timeout(), op).await {
            Ok(result) => result.map_err(Self::map_err),
            Err(_) => Err(AppError::cache("Redis command timed out")),
        }
    }
}

#[async_trait]
impl CacheProvider for RedisCacheProvider {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let full_key = self.client.key(key);
        let mut conn = self.client.connection();
        self.bounded(conn.get::<_, Option<String>>(&full_key)).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> AppResult<()> {
        let full_key = self.client.key(key);
        let mut conn = self.client.connection();
        match ttl {
            // Redis rejects EX 0, so sub-second TTLs round up.
            Some(ttl) => {
                let seconds = ttl.as_secs().max(1);
                self.bounded(conn.set_ex::<_, _, ()>(&full_key, value, seconds))
                    .await
            }
            None => self.bounded(conn.set::<_, _, ()>(&full_key, value)).await,
        }
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let full_key = self.client.key(key);
        let mut conn = self.client.connection();
        self.bounded(conn.del::<_, ()>(&full_key)).await
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        let full_key = self.client.key(key);
        let mut conn = self.client.connection();
        self.bounded(conn.exists::<_, bool>(&full_key)).await
    }

    async fn health_check(&self) -> AppResult<bool> {
        let mut conn = self.client.connection();
        let pong: String = self
            .bounded(redis::cmd("PING").query_async(&mut conn))
            .await?;
        Ok(pong == "PONG")
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
