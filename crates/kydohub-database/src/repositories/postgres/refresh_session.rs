//! Refresh session repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use kydohub_core::result::AppResult;
use kydohub_core::types::{FamilyId, SessionId, TenantId, UserId};
use kydohub_entity::session::RefreshSession;

use super::db_err;
use crate::repositories::RefreshSessionRepository;

const COLUMNS: &str =
    "id, family_id, tenant_id, user_id, token_hash, status, device, created_at, expires_at, ended_at";

/// PostgreSQL-backed refresh sessions.
#[derive(Debug, Clone)]
pub struct PgRefreshSessionRepository {
    pool: PgPool,
}

impl PgRefreshSessionRepository {
    /// Create a new refresh session repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert<'e, E>(executor: E, session: &RefreshSession) -> Result<(), sqlx::Error>
    where
        E: sqlx::PgExecutor<'e>,
    {
        sqlx::query(
            "INSERT INTO refresh_sessions \
             (id, family_id, tenant_id, user_id, token_hash, status, device, created_at, expires_at, ended_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(session.id)
        .bind(session.family_id)
        .bind(session.tenant_id)
        .bind(session.user_id)
        .bind(&session.token_hash)
        .bind(session.status)
        .bind(&session.device)
        .bind(session.created_at)
        .bind(session.expires_at)
        .bind(session.ended_at)
        .execute(executor)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl RefreshSessionRepository for PgRefreshSessionRepository {
    async fn create(&self, session: &RefreshSession) -> AppResult<()> {
        Self::insert(&self.pool, session)
            .await
            .map_err(db_err("Failed to create refresh session"))
    }

    async fn find_by_hash(&self, token_hash: &str) -> AppResult<Option<RefreshSession>> {
        sqlx::query_as::<_, RefreshSession>(&format!(
            "SELECT {COLUMNS} FROM refresh_sessions WHERE token_hash = $1"
        ))
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("Failed to find refresh session"))
    }

    async fn rotate(&self, old_id: SessionId, next: &RefreshSession) -> AppResult<bool> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_err("Failed to begin rotation"))?;

        let claimed = sqlx::query(
            "UPDATE refresh_sessions SET status = 'rotated', ended_at = NOW() \
             WHERE id = $1 AND status = 'active' AND expires_at > NOW()",
        )
        .bind(old_id)
        .execute(&mut *tx)
        .await
        .map_err(db_err("Failed to rotate refresh session"))?;

        if claimed.rows_affected() == 0 {
            tx.rollback()
                .await
                .map_err(db_err("Failed to roll back rotation"))?;
            return Ok(false);
        }

        Self::insert(&mut *tx, next)
            .await
            .map_err(db_err("Failed to store rotated refresh session"))?;
        tx.commit()
            .await
            .map_err(db_err("Failed to commit rotation"))?;
        Ok(true)
    }

    async fn revoke(&self, id: SessionId) -> AppResult<()> {
        sqlx::query(
            "UPDATE refresh_sessions SET status = 'revoked', ended_at = COALESCE(ended_at, NOW()) \
             WHERE id = $1 AND status IN ('active', 'rotated')",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(db_err("Failed to revoke refresh session"))?;
        Ok(())
    }

    async fn revoke_family(&self, family_id: FamilyId) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE refresh_sessions SET status = 'revoked', ended_at = COALESCE(ended_at, NOW()) \
             WHERE family_id = $1 AND status IN ('active', 'rotated')",
        )
        .bind(family_id)
        .execute(&self.pool)
        .await
        .map_err(db_err("Failed to revoke refresh family"))?;
        Ok(result.rows_affected())
    }

    async fn revoke_all_for_user(&self, tenant_id: TenantId, user_id: UserId) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE refresh_sessions SET status = 'revoked', ended_at = COALESCE(ended_at, NOW()) \
             WHERE tenant_id = $1 AND user_id = $2 AND status IN ('active', 'rotated')",
        )
        .bind(tenant_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(db_err("Failed to revoke refresh sessions"))?;
        Ok(result.rows_affected())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM refresh_sessions WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(db_err("Failed to purge refresh sessions"))?;
        Ok(result.rows_affected())
    }
}
