//! Authorization pipeline tuning.

use serde::{Deserialize, Serialize};

/// Permission cache, EV cache, and data-scope settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationConfig {
    /// Lifetime of a cached flattened permission set, in seconds.
    #[serde(default = "default_permset_ttl")]
    pub permset_ttl_seconds: u64,
    /// Lifetime of a cached entitlement version, in seconds. Bounds how long
    /// a cache holding an old value can mask a bump written while it was down.
    #[serde(default = "default_ev_cache_ttl")]
    pub ev_cache_ttl_seconds: u64,
    /// How long a "not revoked" answer is cached per token id, in seconds.
    #[serde(default = "default_revocation_check_ttl")]
    pub revocation_check_ttl_seconds: u64,
    /// How long a failed recomputation is remembered before the database is
    /// asked again for the same key, in milliseconds.
    #[serde(default = "default_negative_cache_ms")]
    pub negative_cache_ms: u64,
    /// Upper bound on concurrent permission recomputations.
    #[serde(default = "default_max_concurrent_recompute")]
    pub max_concurrent_recompute: usize,
    /// Action suffix that grants an unrestricted (tenant-only) scope on its
    /// resource, e.g. `students.list_all`.
    #[serde(default = "default_unrestricted_suffix")]
    pub unrestricted_suffix: String,
}

impl Default for AuthorizationConfig {
    fn default() -> Self {
        Self {
            permset_ttl_seconds: default_permset_ttl(),
            ev_cache_ttl_seconds: default_ev_cache_ttl(),
            revocation_check_ttl_seconds: default_revocation_check_ttl(),
            negative_cache_ms: default_negative_cache_ms(),
            max_concurrent_recompute: default_max_concurrent_recompute(),
            unrestricted_suffix: default_unrestricted_suffix(),
        }
    }
}

fn default_permset_ttl() -> u64 {
    900
}

fn default_ev_cache_ttl() -> u64 {
    300
}

fn default_revocation_check_ttl() -> u64 {
    30
}

fn default_negative_cache_ms() -> u64 {
    5_000
}

fn default_max_concurrent_recompute() -> usize {
    16
}

fn default_unrestricted_suffix() -> String {
    "list_all".to_string()
}
