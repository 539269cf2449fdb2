//! Token bucket rate limiters for the session-lifecycle endpoints.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use tokio::sync::Mutex;
use tracing::warn;

use kydohub_core::config::rate_limit::RateLimitConfig;
use kydohub_core::error::AppError;

use crate::error::ApiError;
use crate::extractors::credential::Credential;
use crate::state::AppState;

/// Message returned when a client is over its budget.
pub const RATE_LIMITED_MESSAGE: &str = "Too many requests. Try again later.";

/// Simple in-memory token bucket rate limiter.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    /// Client key → bucket state.
    buckets: Arc<Mutex<HashMap<String, TokenBucket>>>,
    /// Maximum tokens per bucket.
    max_tokens: u32,
    /// Token refill rate per second.
    refill_rate: f64,
}

#[derive(Debug, Clone)]
struct TokenBucket {
    tokens: f64,
    last_refill: Instant,
}

impl RateLimiter {
    /// Creates a new rate limiter.
    pub fn new(max_tokens: u32, refill_rate: f64) -> Self {
        Self {
            buckets: Arc::new(Mutex::new(HashMap::new())),
            max_tokens,
            refill_rate,
        }
    }

    /// Limiter allowing `burst` requests at once, refilled at `per_minute`.
    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.burst.max(1), f64::from(config.per_minute) / 60.0)
    }

    /// Attempts to consume a token for the given key.
    pub async fn check(&self, key: &str) -> bool {
        let mut buckets = self.buckets.lock().await;
        let now = Instant::now();

        let bucket = buckets.entry(key.to_string()).or_insert(TokenBucket {
            tokens: f64::from(self.max_tokens),
            last_refill: now,
        });

        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.refill_rate).min(f64::from(self.max_tokens));
        bucket.last_refill = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// The per-address and per-user buckets in front of `/auth/*`.
#[derive(Debug, Clone)]
pub struct RateLimits {
    /// Keyed on the client address.
    pub per_ip: RateLimiter,
    /// Keyed on the `sub` of a verified session token.
    pub per_user: RateLimiter,
    trusted_proxies: Arc<[IpAddr]>,
}

impl RateLimits {
    /// Both limiters and the trusted proxy list from configuration.
    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self {
            per_ip: RateLimiter::from_config(config),
            per_user: RateLimiter::new(
                config.user_burst.max(1),
                f64::from(config.user_per_minute) / 60.0,
            ),
            trusted_proxies: config.trusted_proxies.clone().into(),
        }
    }
}

/// Rejects clients that exhausted their bucket with `RateLimited`.
///
/// The address bucket always applies. When the request carries a session
/// token with a valid signature its user bucket applies as well; an invalid
/// token is left for the handler to reject.
pub async fn rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !state.config.rate_limit.enabled {
        return Ok(next.run(request).await);
    }

    let limits = &state.rate_limits;
    let ip = client_ip(&request, &limits.trusted_proxies);
    if !limits.per_ip.check(&ip).await {
        return Err(limited("ip", &ip, &request));
    }

    let user = Credential::from_headers(request.headers(), &state.config.cookies)
        .and_then(|credential| state.codec.verify(&credential.token).ok())
        .map(|claims| claims.sub.to_string());
    if let Some(user) = user {
        if !limits.per_user.check(&user).await {
            return Err(limited("user", &user, &request));
        }
    }

    Ok(next.run(request).await)
}

fn limited(scope: &'static str, key: &str, request: &Request) -> ApiError {
    warn!(
        event = "rate_limited",
        scope,
        client = %key,
        path = %request.uri().path(),
        "Rate limit exceeded"
    );
    AppError::rate_limited(RATE_LIMITED_MESSAGE).into()
}

/// Client address used as the bucket key.
///
/// `X-Forwarded-For` is only read when the socket peer is a trusted proxy;
/// the address is then the right-most hop that is not itself a trusted proxy.
pub fn client_ip(request: &Request, trusted_proxies: &[IpAddr]) -> String {
    let Some(peer) = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
    else {
        return "unknown".to_string();
    };
    if !trusted_proxies.contains(&peer) {
        return peer.to_string();
    }

    let hops: Vec<IpAddr> = request
        .headers()
        .get_all("x-forwarded-for")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|hop| hop.trim().parse().ok())
        .collect();
    hops.iter()
        .rev()
        .find(|hop| !trusted_proxies.contains(*hop))
        .or(hops.first())
        .copied()
        .unwrap_or(peer)
        .to_string()
}
