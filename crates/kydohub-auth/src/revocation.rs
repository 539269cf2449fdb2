//! Revoked access token ids.
//!
//! The cache answers most lookups, both "revoked" and, for a short while,
//! "not revoked"; the durable repository is the source of truth. Reads fail
//! open when neither can answer. Writes fail closed unless the durable
//! record lands.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashSet;
use tracing::{debug, warn};

use kydohub_cache::{CacheManager, keys};
use kydohub_core::config::authorization::AuthorizationConfig;
use kydohub_core::error::AppError;
use kydohub_core::result::AppResult;
use kydohub_core::traits::CacheProvider;
use kydohub_core::types::TokenId;
use kydohub_database::repositories::RevocationRepository;

/// Shortest cache lifetime of a revocation marker.
const MIN_MARKER_TTL_SECS: i64 = 60;

/// Extra lifetime added to a revoked token's remaining validity.
pub const REVOCATION_BUFFER_SECS: i64 = 60;

const REVOKED: &str = "revoked";
const ACTIVE: &str = "active";

/// Cache-first revocation lookups over a durable blocklist.
#[derive(Clone)]
pub struct RevocationStore {
    cache: Arc<CacheManager>,
    repo: Arc<dyn RevocationRepository>,
    active_ttl: Duration,
    /// Token ids revoked while the cache could not be updated; their cached
    /// "active" answer must not be trusted.
    unsynced: Arc<DashSet<TokenId>>,
}

impl std::fmt::Debug for RevocationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RevocationStore")
            .field("cache", &self.cache.name())
            .field("active_ttl", &self.active_ttl)
            .finish()
    }
}

impl RevocationStore {
    /// Creates a new revocation store.
    pub fn new(
        cache: Arc<CacheManager>,
        repo: Arc<dyn RevocationRepository>,
        config: &AuthorizationConfig,
    ) -> Self {
        Self {
            cache,
            repo,
            active_ttl: Duration::from_secs(config.revocation_check_ttl_seconds),
            unsynced: Arc::new(DashSet::new()),
        }
    }

    /// Whether `jti` has been revoked.
    ///
    /// Never errors. When neither the cache nor the repository can answer,
    /// the token is treated as not revoked and a `revocation_fail_open`
    /// event is logged.
    pub async fn is_revoked(&self, jti: TokenId) -> bool {
        let key = keys::revoked_token(jti);
        let mut cache_error = None;
        if !self.unsynced.contains(&jti) {
            match self.cache.get(&key).await {
                Ok(Some(marker)) if marker == REVOKED => return true,
                Ok(Some(marker)) if marker == ACTIVE => return false,
                Ok(_) => {}
                Err(e) => cache_error = Some(e),
            }
        }

        match self.repo.is_revoked(jti, Utc::now()).await {
            Ok(revoked) => {
                if cache_error.is_none() {
                    self.remember(jti, revoked).await;
                }
                revoked
            }
            Err(db_error) => {
                warn!(
                    event = "revocation_fail_open",
                    jti = %jti,
                    cache_error = cache_error.as_ref().map(|e| e.to_string()),
                    db_error = %db_error,
                    "Revocation status unknown; treating token as not revoked"
                );
                false
            }
        }
    }

    /// Revoke `jti` until `expires_at`.
    ///
    /// Succeeds only once the durable record is written. The cached answer
    /// is then overwritten; if that fails, lookups of `jti` bypass the cache
    /// until it can be.
    pub async fn revoke(&self, jti: TokenId, expires_at: DateTime<Utc>) -> AppResult<()> {
        self.repo.insert(jti, expires_at).await.map_err(|e| {
            AppError::with_source(
                kydohub_core::ErrorKind::DependencyUnavailable,
                "Could not confirm revocation",
                e,
            )
        })?;

        let remaining = (expires_at - Utc::now()).num_seconds().max(MIN_MARKER_TTL_SECS);
        let key = keys::revoked_token(jti);
        if let Err(e) = self
            .cache
            .set(&key, REVOKED, Some(Duration::from_secs(remaining as u64)))
            .await
        {
            warn!(jti = %jti, error = %e, "Revocation recorded durably but not cached");
            if self.cache.delete(&key).await.is_err() {
                self.unsynced.insert(jti);
            }
        }

        debug!(jti = %jti, %expires_at, "Token revoked");
        Ok(())
    }

    /// Cache a durable answer.
    async fn remember(&self, jti: TokenId, revoked: bool) {
        let (marker, ttl) = if revoked {
            (REVOKED, Duration::from_secs(MIN_MARKER_TTL_SECS as u64))
        } else {
            (ACTIVE, self.active_ttl)
        };
        match self.cache.set(&keys::revoked_token(jti), marker, Some(ttl)).await {
            Ok(()) => {
                self.unsynced.remove(&jti);
            }
            Err(e) => debug!(error = %e, "Skipping revocation marker write"),
        }
    }
}
