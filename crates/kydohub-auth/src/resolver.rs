//! Membership and role expansion.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use kydohub_core::error::AppError;
use kydohub_core::result::AppResult;
use kydohub_core::types::{TenantId, UserId};
use kydohub_database::repositories::{MembershipRepository, RoleRepository};
use kydohub_entity::membership::MembershipAttributes;

/// Neutral message for every "no usable membership" outcome.
pub const NO_ACCESS_MESSAGE: &str = "You do not have access to this tenant.";

/// What a member of a tenant is entitled to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entitlements {
    /// Role names held.
    pub roles: Vec<String>,
    /// Union of the permissions of every held role.
    pub permissions: BTreeSet<String>,
    /// Scoping attributes of the membership.
    pub attrs: MembershipAttributes,
}

impl Entitlements {
    /// Whether the exact permission string is granted.
    pub fn has(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }
}

/// Anything that can compute a member's entitlements from scratch.
#[async_trait]
pub trait EntitlementSource: Send + Sync + 'static {
    /// Resolve the entitlements of `user_id` in `tenant_id`.
    ///
    /// Fails with `PermissionDenied` when there is no active membership.
    async fn resolve(&self, tenant_id: TenantId, user_id: UserId) -> AppResult<Entitlements>;
}

/// Resolves entitlements from the membership and role repositories.
#[derive(Clone)]
pub struct MembershipResolver {
    memberships: Arc<dyn MembershipRepository>,
    roles: Arc<dyn RoleRepository>,
}

impl std::fmt::Debug for MembershipResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MembershipResolver").finish()
    }
}

impl MembershipResolver {
    /// Creates a new resolver.
    pub fn new(
        memberships: Arc<dyn MembershipRepository>,
        roles: Arc<dyn RoleRepository>,
    ) -> Self {
        Self { memberships, roles }
    }
}

#[async_trait]
impl EntitlementSource for MembershipResolver {
    async fn resolve(&self, tenant_id: TenantId, user_id: UserId) -> AppResult<Entitlements> {
        let membership = match self.memberships.find(tenant_id, user_id).await? {
            Some(m) if m.is_active() => m,
            Some(m) => {
                debug!(tenant_id = %tenant_id, user_id = %user_id, status = %m.status, "Membership not active");
                return Err(AppError::permission_denied(NO_ACCESS_MESSAGE));
            }
            None => {
                debug!(tenant_id = %tenant_id, user_id = %user_id, "No membership");
                return Err(AppError::permission_denied(NO_ACCESS_MESSAGE));
            }
        };

        let role_names: Vec<String> = membership
            .roles
            .iter()
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let permissions = if role_names.is_empty() {
            BTreeSet::new()
        } else {
            self.roles
                .find_by_names(tenant_id, &role_names)
                .await?
                .iter()
                .flat_map(|role| role.normalized_permissions().map(str::to_string))
                .collect()
        };

        Ok(Entitlements {
            roles: role_names,
            permissions,
            attrs: membership.attrs,
        })
    }
}
