//! Role repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;

use kydohub_core::result::AppResult;
use kydohub_core::types::TenantId;
use kydohub_entity::role::Role;

use super::db_err;
use crate::repositories::RoleRepository;

/// PostgreSQL-backed role storage.
#[derive(Debug, Clone)]
pub struct PgRoleRepository {
    pool: PgPool,
}

impl PgRoleRepository {
    /// Create a new role repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoleRepository for PgRoleRepository {
    async fn find_by_names(&self, tenant_id: TenantId, names: &[String]) -> AppResult<Vec<Role>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }
        // NULLS LAST puts the tenant override ahead of the template.
        sqlx::query_as::<_, Role>(
            "SELECT DISTINCT ON (name) tenant_id, name, permissions, updated_at FROM roles \
             WHERE name = ANY($2) AND (tenant_id = $1 OR tenant_id IS NULL) \
             ORDER BY name, tenant_id NULLS LAST",
        )
        .bind(tenant_id)
        .bind(names)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("Failed to load roles"))
    }

    async fn upsert(&self, role: &Role) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO roles (tenant_id, name, permissions, updated_at) VALUES ($1, $2, $3, $4) \
             ON CONFLICT (tenant_id, name) DO UPDATE SET \
               permissions = EXCLUDED.permissions, updated_at = EXCLUDED.updated_at",
        )
        .bind(role.tenant_id)
        .bind(&role.name)
        .bind(&role.permissions)
        .bind(role.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err("Failed to upsert role"))?;
        Ok(())
    }

    async fn set_permissions(
        &self,
        tenant_id: TenantId,
        name: &str,
        permissions: &[String],
    ) -> AppResult<Role> {
        sqlx::query_as::<_, Role>(
            "INSERT INTO roles (tenant_id, name, permissions) VALUES ($1, $2, $3) \
             ON CONFLICT (tenant_id, name) DO UPDATE SET \
               permissions = EXCLUDED.permissions, updated_at = NOW() \
             RETURNING tenant_id, name, permissions, updated_at",
        )
        .bind(tenant_id)
        .bind(name)
        .bind(permissions)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err("Failed to update role permissions"))
    }
}
