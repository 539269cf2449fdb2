//! The authorization context handed to route handlers.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use kydohub_core::types::{DataScope, TenantId, TokenId, UserId};
use kydohub_entity::membership::MembershipAttributes;

use super::query::ScopedQuery;

/// Result of a successful guard run.
///
/// `tenant_id` always comes from the verified session token.
#[derive(Debug, Clone, Serialize)]
pub struct AuthContext {
    /// Correlation id of the request, when one was assigned.
    pub request_id: Option<String>,
    /// Tenant of the session.
    pub tenant_id: TenantId,
    /// Authenticated user.
    pub user_id: UserId,
    /// Role names held in the tenant.
    pub roles: Vec<String>,
    /// Flattened permission set.
    pub permissions: BTreeSet<String>,
    /// Membership attributes.
    pub attrs: MembershipAttributes,
    /// Data scope for the route's resource; unrestricted when the route
    /// declares none.
    pub scope: DataScope,
    /// EV carried by the session token.
    pub ev: i64,
    /// Session token id.
    pub jti: TokenId,
    /// Session token expiry.
    pub expires_at: DateTime<Utc>,
}

impl AuthContext {
    /// Whether the exact permission is granted.
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }

    /// Tenant-bound query filter for data access.
    pub fn scoped_query(&self) -> ScopedQuery {
        ScopedQuery::new(self.tenant_id, self.scope.clone())
    }
}
