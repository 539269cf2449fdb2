//! Application builder: wires state, router and middleware into an Axum app.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::{HeaderValue, header};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use kydohub_auth::{
    AccessAdmin, EvStore, Guard, Housekeeping, MembershipResolver, PermissionCache,
    RevocationStore, ScopeBuilder, SessionManager, TokenCodec,
};
use kydohub_cache::CacheManager;
use kydohub_core::config::AppConfig;
use kydohub_core::error::AppError;
use kydohub_core::result::AppResult;
use kydohub_database::Store;

use crate::middleware::cors::build_cors_layer;
use crate::middleware::logging::request_logging;
use crate::middleware::rate_limit::RateLimits;
use crate::middleware::request_id::assign_request_id;
use crate::router::build_router;
use crate::state::AppState;

/// Wire the authorization components over a store and cache.
pub fn build_state(config: AppConfig, store: Store, cache: Arc<CacheManager>) -> AppResult<AppState> {
    let codec = Arc::new(TokenCodec::new(&config.auth).map_err(AppError::from)?);
    let revocations = RevocationStore::new(
        Arc::clone(&cache),
        store.revocations.clone(),
        &config.authorization,
    );
    let versions = EvStore::new(
        Arc::clone(&cache),
        store.entitlements.clone(),
        &config.authorization,
    );
    let resolver = Arc::new(MembershipResolver::new(
        store.memberships.clone(),
        store.roles.clone(),
    ));
    let permsets = PermissionCache::new(Arc::clone(&cache), resolver, &config.authorization);

    let guard = Guard::new(
        Arc::clone(&codec),
        revocations.clone(),
        versions.clone(),
        permsets.clone(),
        ScopeBuilder::new(&config.authorization),
    );
    let sessions = SessionManager::new(
        &config.auth,
        Arc::clone(&codec),
        &store,
        revocations,
        versions.clone(),
        permsets.clone(),
    );
    let admin = AccessAdmin::new(&store, versions, permsets);
    let rate_limits = RateLimits::from_config(&config.rate_limit);

    Ok(AppState {
        config: Arc::new(config),
        store,
        cache,
        codec,
        guard,
        sessions,
        admin,
        rate_limits,
    })
}

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState) -> Router {
    let server = state.config.server.clone();
    let cors = build_cors_layer(&server.cors, &state.config.cookies);

    build_router(state)
        .layer(axum::middleware::from_fn(request_logging))
        .layer(axum::middleware::from_fn(assign_request_id))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::REFERRER_POLICY,
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ))
        .layer(TimeoutLayer::new(Duration::from_secs(
            server.request_timeout_seconds,
        )))
        .layer(RequestBodyLimitLayer::new(server.body_limit_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Runs the KydoHub server with the given configuration.
pub async fn run_server(config: AppConfig) -> AppResult<()> {
    info!(
        database = %config.database.provider,
        cache = %config.cache.provider,
        "Starting KydoHub server"
    );

    let store = Store::connect(&config.database).await?;
    let cache = Arc::new(CacheManager::new(&config.cache).await?);

    let cleanup = Housekeeping::new(&store).spawn(Duration::from_secs(
        config.server.cleanup_interval_seconds.max(1),
    ));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = build_state(config, store.clone(), cache)?;
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;
    info!(addr = %addr, "KydoHub server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    cleanup.abort();
    store.close().await;
    info!("KydoHub server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl+C; shutting down");
    }
    info!("Shutdown signal received");
}
