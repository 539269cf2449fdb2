//! Role and membership administration.
//!
//! Every mutation that can change what a member may do bumps that member's
//! EV and drops their cached permission set before returning.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::info;

use kydohub_core::error::{AppError, ErrorKind};
use kydohub_core::result::AppResult;
use kydohub_core::types::{TenantId, UserId};
use kydohub_database::Store;
use kydohub_database::repositories::{
    MembershipRepository, RefreshSessionRepository, RoleRepository,
};
use kydohub_entity::membership::{Membership, MembershipStatus};
use kydohub_entity::role::Role;

use crate::entitlement::EvStore;
use crate::permset::PermissionCache;

const MEMBERSHIP_NOT_FOUND: &str = "Membership not found";

/// Administrative changes to tenant access.
#[derive(Clone)]
pub struct AccessAdmin {
    memberships: Arc<dyn MembershipRepository>,
    roles: Arc<dyn RoleRepository>,
    sessions: Arc<dyn RefreshSessionRepository>,
    versions: EvStore,
    permsets: PermissionCache,
}

impl std::fmt::Debug for AccessAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessAdmin").finish_non_exhaustive()
    }
}

impl AccessAdmin {
    /// Creates a new access administrator.
    pub fn new(store: &Store, versions: EvStore, permsets: PermissionCache) -> Self {
        Self {
            memberships: store.memberships.clone(),
            roles: store.roles.clone(),
            sessions: store.refresh_sessions.clone(),
            versions,
            permsets,
        }
    }

    /// Replace the roles of a member.
    pub async fn assign_roles(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        roles: &[String],
    ) -> AppResult<Membership> {
        let roles: Vec<String> = roles
            .iter()
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let membership = self
            .memberships
            .set_roles(tenant_id, user_id, &roles)
            .await?
            .ok_or_else(|| AppError::not_found(MEMBERSHIP_NOT_FOUND))?;

        let ev = self.entitlements_changed(tenant_id, user_id).await?;
        info!(tenant_id = %tenant_id, user_id = %user_id, roles = ?roles, ev, "Roles assigned");
        Ok(membership)
    }

    /// Change the lifecycle status of a member.
    pub async fn set_membership_status(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        status: MembershipStatus,
    ) -> AppResult<Membership> {
        let membership = self
            .memberships
            .set_status(tenant_id, user_id, status)
            .await?
            .ok_or_else(|| AppError::not_found(MEMBERSHIP_NOT_FOUND))?;

        let ev = self.entitlements_changed(tenant_id, user_id).await?;
        info!(tenant_id = %tenant_id, user_id = %user_id, %status, ev, "Membership status changed");
        Ok(membership)
    }

    /// Replace the permissions of a tenant role. Every active holder of the
    /// role gets a new EV.
    pub async fn update_role_permissions(
        &self,
        tenant_id: TenantId,
        role: &str,
        permissions: &[String],
    ) -> AppResult<Role> {
        let role = role.trim();
        if role.is_empty() {
            return Err(AppError::validation("Role name is required"));
        }

        let updated = self
            .roles
            .set_permissions(tenant_id, role, permissions)
            .await?;

        let holders = self.memberships.list_active_by_role(tenant_id, role).await?;
        for holder in &holders {
            self.entitlements_changed(tenant_id, holder.user_id).await?;
        }

        info!(tenant_id = %tenant_id, role, affected = holders.len(), "Role permissions updated");
        Ok(updated)
    }

    /// End every session of a member in a tenant.
    ///
    /// Returns only after the EV bump and the refresh session revocation are
    /// both durable; outstanding access tokens fail the EV check from then on.
    pub async fn logout_all(&self, tenant_id: TenantId, user_id: UserId) -> AppResult<i64> {
        if self.memberships.find(tenant_id, user_id).await?.is_none() {
            return Err(AppError::not_found(MEMBERSHIP_NOT_FOUND));
        }

        let ev = self.entitlements_changed(tenant_id, user_id).await?;
        let revoked = self
            .sessions
            .revoke_all_for_user(tenant_id, user_id)
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::DependencyUnavailable,
                    "Could not confirm session revocation",
                    e,
                )
            })?;

        info!(tenant_id = %tenant_id, user_id = %user_id, revoked, ev, "Logged out everywhere");
        Ok(ev)
    }

    async fn entitlements_changed(&self, tenant_id: TenantId, user_id: UserId) -> AppResult<i64> {
        let ev = self.versions.bump(tenant_id, user_id).await?;
        self.permsets.invalidate(tenant_id, user_id).await;
        Ok(ev)
    }
}
