//! Shared cache for EVs, permission sets and revocation markers.

use serde::{Deserialize, Serialize};

/// Which cache backs the authorization state, and how.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// `"memory"` (per process), `"redis"` (shared), or `"none"`.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// TTL applied to writes that do not name one. `0` keeps them until evicted.
    #[serde(default = "default_ttl_seconds")]
    pub default_ttl_seconds: u64,
    #[serde(default)]
    pub redis: RedisCacheConfig,
    #[serde(default)]
    pub memory: MemoryCacheConfig,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            default_ttl_seconds: default_ttl_seconds(),
            redis: RedisCacheConfig::default(),
            memory: MemoryCacheConfig::default(),
        }
    }
}

/// Redis connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisCacheConfig {
    #[serde(default = "default_redis_url")]
    pub url: String,
    /// Prepended to every key so several deployments can share one server.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    /// A slower command counts as a cache failure and the caller falls back
    /// to the database.
    #[serde(default = "default_response_timeout_ms")]
    pub response_timeout_ms: u64,
}

impl Default for RedisCacheConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            key_prefix: default_key_prefix(),
            response_timeout_ms: default_response_timeout_ms(),
        }
    }
}

/// In-process cache bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryCacheConfig {
    /// Entry count before least-recently-used eviction starts.
    #[serde(default = "default_max_capacity")]
    pub max_capacity: u64,
}

impl Default for MemoryCacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: default_max_capacity(),
        }
    }
}

fn default_provider() -> String {
    "memory".to_string()
}

fn default_ttl_seconds() -> u64 {
    3_600
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_key_prefix() -> String {
    "kydohub:".to_string()
}

fn default_response_timeout_ms() -> u64 {
    500
}

fn default_max_capacity() -> u64 {
    100_000
}
