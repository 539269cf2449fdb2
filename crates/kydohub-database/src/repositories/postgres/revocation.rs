//! Revoked token repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use kydohub_core::result::AppResult;
use kydohub_core::types::TokenId;

use super::db_err;
use crate::repositories::RevocationRepository;

/// PostgreSQL-backed revocation list.
#[derive(Debug, Clone)]
pub struct PgRevocationRepository {
    pool: PgPool,
}

impl PgRevocationRepository {
    /// Create a new revocation repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RevocationRepository for PgRevocationRepository {
    async fn insert(&self, jti: TokenId, expires_at: DateTime<Utc>) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO revoked_tokens (jti, expires_at) VALUES ($1, $2) \
             ON CONFLICT (jti) DO UPDATE SET expires_at = GREATEST(revoked_tokens.expires_at, EXCLUDED.expires_at)",
        )
        .bind(jti)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(db_err("Failed to record revoked token"))?;
        Ok(())
    }

    async fn is_revoked(&self, jti: TokenId, now: DateTime<Utc>) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM revoked_tokens WHERE jti = $1 AND expires_at > $2)",
        )
        .bind(jti)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err("Failed to check revoked token"))
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM revoked_tokens WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(db_err("Failed to purge revoked tokens"))?;
        Ok(result.rows_affected())
    }
}
