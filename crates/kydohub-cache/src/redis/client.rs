//! Reconnecting Redis connection with a key namespace.

use std::time::Duration;

use redis::aio::ConnectionManager;
use tracing::info;

use kydohub_core::config::cache::RedisCacheConfig;
use kydohub_core::config::redact_url;
use kydohub_core::error::{AppError, ErrorKind};
use kydohub_core::result::AppResult;

/// Shared handle to Redis. Clones reuse the same multiplexed connection.
#[derive(Clone)]
pub struct RedisClient {
    conn: ConnectionManager,
    namespace: String,
    timeout: Duration,
}

impl std::fmt::Debug for RedisClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisClient")
            .field("namespace", &self.namespace)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl RedisClient {
    /// Connect and confirm the server answers within the command timeout.
    ///
    /// Startup fails here rather than on the first guarded request.
    pub async fn connect(config: &RedisCacheConfig) -> AppResult<Self> {
        let timeout = Duration::from_millis(config.response_timeout_ms.max(1));
        let target = redact_url(&config.url);

        let client = redis::Client::open(config.url.as_str())
            .map_err(|e| cache_error(format!("Invalid cache.redis.url {target}"), e))?;
        let mut conn = ConnectionManager::new(client)
            .await
            .map_err(|e| cache_error(format!("Could not reach Redis at {target}"), e))?;

        let pong: String = tokio::time::timeout(timeout, redis::cmd("PING").query_async::<String>(&mut conn))
            .await
            .map_err(|_| AppError::cache(format!("Redis at {target} did not answer PING")))?
            .map_err(|e| cache_error(format!("Redis at {target} rejected PING"), e))?;

        info!(target_cache = %target, namespace = %config.key_prefix, reply = %pong, "Redis connected");
        Ok(Self {
            conn,
            namespace: config.key_prefix.clone(),
            timeout,
        })
    }

    /// A handle for issuing commands.
    pub fn connection(&self) -> ConnectionManager {
        self.conn.clone()
    }

    /// `key` inside this deployment's namespace.
    pub fn key(&self, key: &str) -> String {
        format!("{}{key}", self.namespace)
    }

    /// Upper bound on one command round trip.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

fn cache_error(message: String, source: redis::RedisError) -> AppError {
    AppError::with_source(ErrorKind::Cache, message, source)
}
