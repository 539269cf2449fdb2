//! Repository traits for every entity the guard pipeline touches, with
//! PostgreSQL and in-memory implementations.
//!
//! Every tenant-owned read takes the tenant id explicitly; listings also
//! take the caller's [`DataScope`], so no query can run unscoped.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use kydohub_core::result::AppResult;
use kydohub_core::types::{DataScope, FamilyId, SessionId, TenantId, TokenId, UserId};
use kydohub_entity::membership::{Membership, MembershipStatus};
use kydohub_entity::role::Role;
use kydohub_entity::session::RefreshSession;
use kydohub_entity::student::Student;
use kydohub_entity::ui::UiResources;

/// Entitlement version assumed for a member that has never been bumped.
pub const EV_BASELINE: i64 = 1;

/// Tenant membership storage.
#[async_trait]
pub trait MembershipRepository: Send + Sync + 'static {
    /// Membership of `user_id` in `tenant_id`, in any status.
    async fn find(&self, tenant_id: TenantId, user_id: UserId) -> AppResult<Option<Membership>>;

    /// Every membership of a user, across tenants.
    async fn list_for_user(&self, user_id: UserId) -> AppResult<Vec<Membership>>;

    /// Active memberships of a tenant that hold `role`.
    async fn list_active_by_role(&self, tenant_id: TenantId, role: &str) -> AppResult<Vec<Membership>>;

    /// Insert or replace a membership.
    async fn upsert(&self, membership: &Membership) -> AppResult<()>;

    /// Replace the role list. Returns `None` when no membership exists.
    async fn set_roles(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        roles: &[String],
    ) -> AppResult<Option<Membership>>;

    /// Change the status. Returns `None` when no membership exists.
    async fn set_status(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        status: MembershipStatus,
    ) -> AppResult<Option<Membership>>;
}

/// Role definitions.
#[async_trait]
pub trait RoleRepository: Send + Sync + 'static {
    /// Roles named in `names` as seen by `tenant_id`: a tenant-scoped role
    /// shadows the default template of the same name.
    async fn find_by_names(&self, tenant_id: TenantId, names: &[String]) -> AppResult<Vec<Role>>;

    /// Insert or replace a role.
    async fn upsert(&self, role: &Role) -> AppResult<()>;

    /// Set the permission list of a tenant's role, creating the tenant
    /// override when only a template existed.
    async fn set_permissions(
        &self,
        tenant_id: TenantId,
        name: &str,
        permissions: &[String],
    ) -> AppResult<Role>;
}

/// Durable entitlement versions.
#[async_trait]
pub trait EntitlementRepository: Send + Sync + 'static {
    /// Stored version, or `None` when the member was never seeded or bumped.
    async fn current(&self, tenant_id: TenantId, user_id: UserId) -> AppResult<Option<i64>>;

    /// Store [`EV_BASELINE`] unless a version already exists; return the stored version.
    async fn ensure_baseline(&self, tenant_id: TenantId, user_id: UserId) -> AppResult<i64>;

    /// Increment atomically and return the new version.
    async fn bump(&self, tenant_id: TenantId, user_id: UserId) -> AppResult<i64>;
}

/// Durable record of revoked access token ids.
#[async_trait]
pub trait RevocationRepository: Send + Sync + 'static {
    /// Record `jti` as revoked until `expires_at`.
    async fn insert(&self, jti: TokenId, expires_at: DateTime<Utc>) -> AppResult<()>;

    /// Whether `jti` is revoked and the entry has not lapsed at `now`.
    async fn is_revoked(&self, jti: TokenId, now: DateTime<Utc>) -> AppResult<bool>;

    /// Delete entries that lapsed before `now`.
    async fn purge_expired(&self, now: DateTime<Utc>) -> AppResult<u64>;
}

/// Refresh session storage.
#[async_trait]
pub trait RefreshSessionRepository: Send + Sync + 'static {
    /// Persist a new session.
    async fn create(&self, session: &RefreshSession) -> AppResult<()>;

    /// Session by token hash, in any status.
    async fn find_by_hash(&self, token_hash: &str) -> AppResult<Option<RefreshSession>>;

    /// Mark `old_id` rotated and persist `next` atomically. Returns `false`
    /// when `old_id` was no longer active, in which case nothing is written.
    async fn rotate(&self, old_id: SessionId, next: &RefreshSession) -> AppResult<bool>;

    /// Revoke one session.
    async fn revoke(&self, id: SessionId) -> AppResult<()>;

    /// Revoke every non-ended session in a rotation family.
    async fn revoke_family(&self, family_id: FamilyId) -> AppResult<u64>;

    /// Revoke every non-ended session of a member.
    async fn revoke_all_for_user(&self, tenant_id: TenantId, user_id: UserId) -> AppResult<u64>;

    /// Delete sessions whose expiry passed before `now`.
    async fn purge_expired(&self, now: DateTime<Utc>) -> AppResult<u64>;
}

/// Per-tenant UI resource declarations.
#[async_trait]
pub trait UiResourceRepository: Send + Sync + 'static {
    /// Declarations of a tenant; empty when none are configured.
    async fn get(&self, tenant_id: TenantId) -> AppResult<UiResources>;

    /// Replace the declarations of a tenant.
    async fn put(&self, tenant_id: TenantId, resources: &UiResources) -> AppResult<()>;
}

/// Student records.
#[async_trait]
pub trait StudentRepository: Send + Sync + 'static {
    /// Students of `tenant_id` visible under `scope`, ordered by name.
    async fn list(&self, tenant_id: TenantId, scope: &DataScope) -> AppResult<Vec<Student>>;

    /// Insert or replace a student.
    async fn upsert(&self, student: &Student) -> AppResult<()>;
}
