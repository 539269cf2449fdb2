//! Membership repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::types::Json;

use kydohub_core::result::AppResult;
use kydohub_core::types::{TenantId, UserId};
use kydohub_entity::membership::{Membership, MembershipStatus};

use super::db_err;
use crate::repositories::MembershipRepository;

const COLUMNS: &str = "tenant_id, user_id, roles, status, attrs, created_at, updated_at";

/// PostgreSQL-backed membership storage.
#[derive(Debug, Clone)]
pub struct PgMembershipRepository {
    pool: PgPool,
}

impl PgMembershipRepository {
    /// Create a new membership repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MembershipRepository for PgMembershipRepository {
    async fn find(&self, tenant_id: TenantId, user_id: UserId) -> AppResult<Option<Membership>> {
        sqlx::query_as::<_, Membership>(&format!(
            "SELECT {COLUMNS} FROM memberships WHERE tenant_id = $1 AND user_id = $2"
        ))
        .bind(tenant_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("Failed to find membership"))
    }

    async fn list_for_user(&self, user_id: UserId) -> AppResult<Vec<Membership>> {
        sqlx::query_as::<_, Membership>(&format!(
            "SELECT {COLUMNS} FROM memberships WHERE user_id = $1 ORDER BY created_at"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("Failed to list memberships for user"))
    }

    async fn list_active_by_role(&self, tenant_id: TenantId, role: &str) -> AppResult<Vec<Membership>> {
        sqlx::query_as::<_, Membership>(&format!(
            "SELECT {COLUMNS} FROM memberships \
             WHERE tenant_id = $1 AND status = 'active' AND $2 = ANY(roles)"
        ))
        .bind(tenant_id)
        .bind(role)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("Failed to list memberships by role"))
    }

    async fn upsert(&self, membership: &Membership) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO memberships (tenant_id, user_id, roles, status, attrs, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (tenant_id, user_id) DO UPDATE SET \
               roles = EXCLUDED.roles, status = EXCLUDED.status, attrs = EXCLUDED.attrs, \
               updated_at = EXCLUDED.updated_at",
        )
        .bind(membership.tenant_id)
        .bind(membership.user_id)
        .bind(&membership.roles)
        .bind(membership.status)
        .bind(Json(&membership.attrs))
        .bind(membership.created_at)
        .bind(membership.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err("Failed to upsert membership"))?;
        Ok(())
    }

    async fn set_roles(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        roles: &[String],
    ) -> AppResult<Option<Membership>> {
        sqlx::query_as::<_, Membership>(&format!(
            "UPDATE memberships SET roles = $3, updated_at = NOW() \
             WHERE tenant_id = $1 AND user_id = $2 RETURNING {COLUMNS}"
        ))
        .bind(tenant_id)
        .bind(user_id)
        .bind(roles)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("Failed to update membership roles"))
    }

    async fn set_status(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        status: MembershipStatus,
    ) -> AppResult<Option<Membership>> {
        sqlx::query_as::<_, Membership>(&format!(
            "UPDATE memberships SET status = $3, updated_at = NOW() \
             WHERE tenant_id = $1 AND user_id = $2 RETURNING {COLUMNS}"
        ))
        .bind(tenant_id)
        .bind(user_id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("Failed to update membership status"))
    }
}
