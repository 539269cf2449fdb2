//! Cached permission sets with single-flight recomputation.
//!
//! Concurrent misses for the same member share one computation. The
//! computation runs on its own task, so a caller that goes away does not
//! cancel it for the others. Recomputations are bounded by a semaphore, and
//! a backing-store failure is remembered for a short window so an outage
//! does not turn every request into another database round trip.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use kydohub_cache::{CacheManager, keys};
use kydohub_core::config::authorization::AuthorizationConfig;
use kydohub_core::error::AppError;
use kydohub_core::result::AppResult;
use kydohub_core::traits::CacheProvider;
use kydohub_core::types::{TenantId, UserId};

use crate::resolver::{EntitlementSource, Entitlements};

type Flight = Shared<BoxFuture<'static, Result<Arc<Entitlements>, AppError>>>;

/// Cached form: the entitlements and the EV they were computed under.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedEntitlements {
    /// 0 when the EV was unknown at compute time.
    ev: i64,
    entitlements: Entitlements,
}

/// TTL cache of resolved entitlements keyed by (tenant, user).
#[derive(Clone)]
pub struct PermissionCache {
    inner: Arc<Inner>,
}

struct Inner {
    cache: Arc<CacheManager>,
    source: Arc<dyn EntitlementSource>,
    in_flight: DashMap<String, Flight>,
    negative: DashMap<String, (Instant, AppError)>,
    permits: Arc<Semaphore>,
    ttl: Duration,
    negative_window: Duration,
}

impl std::fmt::Debug for PermissionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionCache")
            .field("cache", &self.inner.cache.name())
            .field("ttl", &self.inner.ttl)
            .field("in_flight", &self.inner.in_flight.len())
            .finish()
    }
}

impl PermissionCache {
    /// Creates a new permission cache over `source`.
    pub fn new(
        cache: Arc<CacheManager>,
        source: Arc<dyn EntitlementSource>,
        config: &AuthorizationConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                cache,
                source,
                in_flight: DashMap::new(),
                negative: DashMap::new(),
                permits: Arc::new(Semaphore::new(config.max_concurrent_recompute.max(1))),
                ttl: Duration::from_secs(config.permset_ttl_seconds),
                negative_window: Duration::from_millis(config.negative_cache_ms),
            }),
        }
    }

    /// Entitlements of a member, from cache or freshly resolved.
    ///
    /// `ev` is the member's current entitlement version, when known. A
    /// cached set computed under an older version is ignored.
    pub async fn get_or_compute(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        ev: Option<i64>,
    ) -> AppResult<Arc<Entitlements>> {
        let key = keys::permission_set(tenant_id, user_id);
        let min_ev = ev.unwrap_or(0);

        if let Some(hit) = self.inner.lookup(&key, min_ev).await {
            return Ok(hit);
        }

        if let Some(err) = self.inner.recent_failure(&key) {
            return Err(err);
        }

        let flight_key = format!("{key}@{min_ev}");
        let flight = match self.inner.in_flight.entry(flight_key.clone()) {
            Entry::Occupied(existing) => existing.get().clone(),
            Entry::Vacant(slot) => {
                let flight =
                    Inner::launch(self.inner.clone(), key, flight_key, tenant_id, user_id, min_ev);
                slot.insert(flight.clone());
                flight
            }
        };

        flight.await
    }

    /// Drop the cached set of a member so the next request recomputes it.
    pub async fn invalidate(&self, tenant_id: TenantId, user_id: UserId) {
        let key = keys::permission_set(tenant_id, user_id);
        self.inner.negative.remove(&key);
        if let Err(e) = self.inner.cache.delete(&key).await {
            warn!(
                event = "permset_cache_unavailable",
                key = %key,
                error = %e,
                "Failed to invalidate cached permission set"
            );
        }
    }

    /// Number of computations currently running.
    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.len()
    }
}

impl Inner {
    async fn lookup(&self, key: &str, min_ev: i64) -> Option<Arc<Entitlements>> {
        match self.cache.get_json::<CachedEntitlements>(key).await {
            Ok(Some(cached)) if cached.ev >= min_ev => Some(Arc::new(cached.entitlements)),
            Ok(_) => None,
            Err(e) => {
                warn!(
                    event = "permset_cache_unavailable",
                    key,
                    error = %e,
                    "Permission cache unreachable; recomputing"
                );
                None
            }
        }
    }

    fn recent_failure(&self, key: &str) -> Option<AppError> {
        let entry = self.negative.get(key)?;
        let (at, err) = entry.value();
        if at.elapsed() < self.negative_window {
            return Some(err.clone());
        }
        drop(entry);
        self.negative.remove(key);
        None
    }

    fn launch(
        this: Arc<Self>,
        key: String,
        flight_key: String,
        tenant_id: TenantId,
        user_id: UserId,
        min_ev: i64,
    ) -> Flight {
        let handle = tokio::spawn(async move {
            let result = this.compute(&key, tenant_id, user_id, min_ev).await;
            this.in_flight.remove(&flight_key);
            result
        });

        async move {
            handle
                .await
                .unwrap_or_else(|e| Err(AppError::internal(format!("Permission computation aborted: {e}"))))
        }
        .boxed()
        .shared()
    }

    async fn compute(
        &self,
        key: &str,
        tenant_id: TenantId,
        user_id: UserId,
        min_ev: i64,
    ) -> Result<Arc<Entitlements>, AppError> {
        let _permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| AppError::internal(format!("Recompute limiter closed: {e}")))?;

        // Another flight may have filled the cache while this one waited.
        if let Some(hit) = self.lookup(key, min_ev).await {
            return Ok(hit);
        }

        let entitlements = match self.source.resolve(tenant_id, user_id).await {
            Ok(entitlements) => entitlements,
            Err(e) => {
                if e.kind.is_backing_store_failure() {
                    self.negative
                        .insert(key.to_string(), (Instant::now(), e.clone()));
                }
                return Err(e);
            }
        };

        let cached = CachedEntitlements {
            ev: min_ev,
            entitlements,
        };
        if let Err(e) = self.cache.set_json(key, &cached, Some(self.ttl)).await {
            debug!(key, error = %e, "Skipping permission set cache write");
        }

        Ok(Arc::new(cached.entitlements))
    }
}
