//! Shared application state passed to all handlers via Axum's state extractor.

use std::sync::Arc;

use kydohub_auth::{AccessAdmin, Guard, SessionManager, TokenCodec};
use kydohub_cache::CacheManager;
use kydohub_core::config::AppConfig;
use kydohub_database::Store;

use crate::middleware::rate_limit::RateLimits;

/// Application state shared across all request handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Repository handles.
    pub store: Store,
    /// Cache manager.
    pub cache: Arc<CacheManager>,
    /// Session token signer and verifier.
    pub codec: Arc<TokenCodec>,
    /// Per-request authorization pipeline.
    pub guard: Guard,
    /// Session issue, rotation and teardown.
    pub sessions: SessionManager,
    /// Role and membership administration.
    pub admin: AccessAdmin,
    /// Limiters for the session-lifecycle endpoints.
    pub rate_limits: RateLimits,
}
