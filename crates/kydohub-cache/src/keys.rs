//! Cache key builders for every KydoHub cache entry.
//!
//! Centralising key construction prevents typos and makes it easy
//! to find every key the application uses. The Redis provider adds the
//! configured deployment prefix on top of these.

use kydohub_core::types::{TenantId, TokenId, UserId};

/// Revocation marker for one access token id.
pub fn revoked_token(jti: TokenId) -> String {
    format!("jti:block:{jti}")
}

/// Current entitlement version of a member.
pub fn entitlement_version(tenant_id: TenantId, user_id: UserId) -> String {
    format!("ev:{tenant_id}:{user_id}")
}

/// Flattened roles, permissions, and attributes of a member.
pub fn permission_set(tenant_id: TenantId, user_id: UserId) -> String {
    format!("permset:{tenant_id}:{user_id}")
}
