//! Entitlement version repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;

use kydohub_core::result::AppResult;
use kydohub_core::types::{TenantId, UserId};

use super::db_err;
use crate::repositories::{EV_BASELINE, EntitlementRepository};

/// PostgreSQL-backed entitlement versions.
#[derive(Debug, Clone)]
pub struct PgEntitlementRepository {
    pool: PgPool,
}

impl PgEntitlementRepository {
    /// Create a new entitlement repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EntitlementRepository for PgEntitlementRepository {
    async fn current(&self, tenant_id: TenantId, user_id: UserId) -> AppResult<Option<i64>> {
        sqlx::query_scalar::<_, i64>(
            "SELECT version FROM entitlement_versions WHERE tenant_id = $1 AND user_id = $2",
        )
        .bind(tenant_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("Failed to read entitlement version"))
    }

    async fn ensure_baseline(&self, tenant_id: TenantId, user_id: UserId) -> AppResult<i64> {
        // The no-op update makes RETURNING yield the existing row on conflict.
        sqlx::query_scalar::<_, i64>(
            "INSERT INTO entitlement_versions (tenant_id, user_id, version) VALUES ($1, $2, $3) \
             ON CONFLICT (tenant_id, user_id) DO UPDATE SET version = entitlement_versions.version \
             RETURNING version",
        )
        .bind(tenant_id)
        .bind(user_id)
        .bind(EV_BASELINE)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err("Failed to seed entitlement version"))
    }

    async fn bump(&self, tenant_id: TenantId, user_id: UserId) -> AppResult<i64> {
        sqlx::query_scalar::<_, i64>(
            "INSERT INTO entitlement_versions (tenant_id, user_id, version) VALUES ($1, $2, $3) \
             ON CONFLICT (tenant_id, user_id) DO UPDATE SET \
               version = entitlement_versions.version + 1, updated_at = NOW() \
             RETURNING version",
        )
        .bind(tenant_id)
        .bind(user_id)
        .bind(EV_BASELINE + 1)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err("Failed to bump entitlement version"))
    }
}
