//! Rate limiting configuration.

use std::net::IpAddr;

use serde::{Deserialize, Serialize};

/// Token buckets applied to `/auth/*`: one per client address, and one per
/// user when the request carries a valid session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Whether the limiter is active.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Per-address bucket capacity (burst size).
    #[serde(default = "default_burst")]
    pub burst: u32,
    /// Per-address tokens restored per minute.
    #[serde(default = "default_per_minute")]
    pub per_minute: u32,
    /// Per-user bucket capacity.
    #[serde(default = "default_user_burst")]
    pub user_burst: u32,
    /// Per-user tokens restored per minute.
    #[serde(default = "default_user_per_minute")]
    pub user_per_minute: u32,
    /// Peers whose `X-Forwarded-For` header is believed. Requests from any
    /// other peer are keyed on the socket address.
    #[serde(default)]
    pub trusted_proxies: Vec<IpAddr>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            burst: default_burst(),
            per_minute: default_per_minute(),
            user_burst: default_user_burst(),
            user_per_minute: default_user_per_minute(),
            trusted_proxies: Vec::new(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_burst() -> u32 {
    20
}

fn default_per_minute() -> u32 {
    20
}

fn default_user_burst() -> u32 {
    600
}

fn default_user_per_minute() -> u32 {
    600
}
