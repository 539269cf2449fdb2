//! Entitlement versions (EV) per tenant member.
//!
//! A member's EV increases whenever their effective permissions may have
//! changed. Tokens carry the EV they were minted with; a token whose EV is
//! below the current one is stale.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashSet;
use tracing::{debug, error, warn};

use kydohub_cache::{CacheManager, keys};
use kydohub_core::config::authorization::AuthorizationConfig;
use kydohub_core::error::{AppError, ErrorKind};
use kydohub_core::result::AppResult;
use kydohub_core::traits::CacheProvider;
use kydohub_core::types::{TenantId, UserId};
use kydohub_database::repositories::{EV_BASELINE, EntitlementRepository};

enum Cached {
    Hit(i64),
    Miss,
    Unreachable,
}

/// Cache-first reads and durable bumps of entitlement versions.
#[derive(Clone)]
pub struct EvStore {
    cache: Arc<CacheManager>,
    repo: Arc<dyn EntitlementRepository>,
    ttl: Duration,
    /// Keys whose cached copy may be older than the durable version.
    unsynced: Arc<DashSet<String>>,
}

impl std::fmt::Debug for EvStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvStore")
            .field("cache", &self.cache.name())
            .field("ttl", &self.ttl)
            .field("unsynced", &self.unsynced.len())
            .finish()
    }
}

impl EvStore {
    /// Creates a new EV store.
    pub fn new(
        cache: Arc<CacheManager>,
        repo: Arc<dyn EntitlementRepository>,
        config: &AuthorizationConfig,
    ) -> Self {
        Self {
            cache,
            repo,
            ttl: Duration::from_secs(config.ev_cache_ttl_seconds),
            unsynced: Arc::new(DashSet::new()),
        }
    }

    /// Current version of a member.
    ///
    /// Returns `None` only when neither the cache nor the repository could
    /// answer; callers then skip the staleness check for this request. A
    /// member that was never bumped reads as the baseline. A key whose bump
    /// could not reach the cache is read from the repository until the
    /// cached copy has been overwritten.
    pub async fn current(&self, tenant_id: TenantId, user_id: UserId) -> Option<i64> {
        let key = keys::entitlement_version(tenant_id, user_id);
        let cache_ok = if self.unsynced.contains(&key) {
            true
        } else {
            match self.read_cached(&key).await {
                Cached::Hit(version) => return Some(version),
                Cached::Miss => true,
                Cached::Unreachable => false,
            }
        };

        match self.repo.current(tenant_id, user_id).await {
            Ok(stored) => {
                let version = stored.unwrap_or(EV_BASELINE);
                if cache_ok {
                    self.cache_version(&key, version).await;
                }
                Some(version)
            }
            Err(e) => {
                error!(
                    event = "ev_degraded",
                    tenant_id = %tenant_id,
                    user_id = %user_id,
                    error = %e,
                    "Entitlement version unavailable; staleness check skipped"
                );
                None
            }
        }
    }

    async fn read_cached(&self, key: &str) -> Cached {
        match self.cache.get(key).await {
            Ok(Some(raw)) => match raw.parse::<i64>() {
                Ok(version) => Cached::Hit(version),
                Err(_) => {
                    warn!(key = %key, "Discarding malformed cached entitlement version");
                    Cached::Miss
                }
            },
            Ok(None) => Cached::Miss,
            Err(e) => {
                debug!(error = %e, "EV cache read failed; reading durable store");
                Cached::Unreachable
            }
        }
    }

    /// Make sure a member has a stored version; returns it.
    pub async fn seed(&self, tenant_id: TenantId, user_id: UserId) -> AppResult<i64> {
        let version = self.repo.ensure_baseline(tenant_id, user_id).await?;
        self.cache_version(&keys::entitlement_version(tenant_id, user_id), version)
            .await;
        Ok(version)
    }

    /// Increment a member's version and return the new value.
    ///
    /// The durable increment must succeed; the cached copy is then
    /// overwritten, or dropped if it cannot be overwritten.
    pub async fn bump(&self, tenant_id: TenantId, user_id: UserId) -> AppResult<i64> {
        let version = self.repo.bump(tenant_id, user_id).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::DependencyUnavailable,
                "Could not record entitlement change",
                e,
            )
        })?;

        let key = keys::entitlement_version(tenant_id, user_id);
        if let Err(e) = self
            .cache
            .set(&key, &version.to_string(), Some(self.ttl))
            .await
        {
            warn!(key = %key, error = %e, "Failed to cache bumped entitlement version");
            if self.cache.delete(&key).await.is_err() {
                self.unsynced.insert(key);
            } else {
                self.unsynced.remove(&key);
            }
        } else {
            self.unsynced.remove(&key);
        }

        debug!(tenant_id = %tenant_id, user_id = %user_id, version, "Entitlement version bumped");
        Ok(version)
    }

    async fn cache_version(&self, key: &str, version: i64) {
        match self
            .cache
            .set(key, &version.to_string(), Some(self.ttl))
            .await
        {
            Ok(()) => {
                self.unsynced.remove(key);
            }
            Err(e) => debug!(key, error = %e, "Skipping entitlement version cache write"),
        }
    }
}
