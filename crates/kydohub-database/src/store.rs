//! Bundle of repository handles selected by configuration.

use std::sync::Arc;

use tracing::info;

use kydohub_core::config::database::DatabaseConfig;
use kydohub_core::error::AppError;
use kydohub_core::result::AppResult;

use crate::pool::DatabasePool;
use crate::repositories::memory::MemoryDatabase;
use crate::repositories::postgres::{
    PgEntitlementRepository, PgMembershipRepository, PgRefreshSessionRepository,
    PgRevocationRepository, PgRoleRepository, PgStudentRepository, PgUiResourceRepository,
};
use crate::repositories::{
    EntitlementRepository, MembershipRepository, RefreshSessionRepository, RevocationRepository,
    RoleRepository, StudentRepository, UiResourceRepository,
};

/// Every repository the application uses, behind trait objects.
#[derive(Clone)]
pub struct Store {
    /// Tenant memberships.
    pub memberships: Arc<dyn MembershipRepository>,
    /// Role definitions.
    pub roles: Arc<dyn RoleRepository>,
    /// Entitlement versions.
    pub entitlements: Arc<dyn EntitlementRepository>,
    /// Revoked access token ids.
    pub revocations: Arc<dyn RevocationRepository>,
    /// Refresh sessions.
    pub refresh_sessions: Arc<dyn RefreshSessionRepository>,
    /// UI resource declarations.
    pub ui_resources: Arc<dyn UiResourceRepository>,
    /// Student records.
    pub students: Arc<dyn StudentRepository>,
    /// Connection pool, when backed by PostgreSQL.
    pool: Option<DatabasePool>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("backend", &self.backend())
            .finish_non_exhaustive()
    }
}

impl Store {
    /// Open the configured backing store, running migrations when asked.
    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        match config.provider.as_str() {
            "postgres" => {
                let pool = DatabasePool::connect(config).await?;
                if config.run_migrations {
                    pool.migrate().await?;
                }
                Ok(Self::postgres(pool))
            }
            "memory" => {
                info!("Using in-memory store; data is lost on restart");
                Ok(Self::memory(MemoryDatabase::new()))
            }
            other => Err(AppError::configuration(format!(
                "Unknown database provider: '{other}'. Supported: postgres, memory"
            ))),
        }
    }

    /// Build a store over a PostgreSQL pool.
    pub fn postgres(pool: DatabasePool) -> Self {
        let pg = pool.pool().clone();
        Self {
            memberships: Arc::new(PgMembershipRepository::new(pg.clone())),
            roles: Arc::new(PgRoleRepository::new(pg.clone())),
            entitlements: Arc::new(PgEntitlementRepository::new(pg.clone())),
            revocations: Arc::new(PgRevocationRepository::new(pg.clone())),
            refresh_sessions: Arc::new(PgRefreshSessionRepository::new(pg.clone())),
            ui_resources: Arc::new(PgUiResourceRepository::new(pg.clone())),
            students: Arc::new(PgStudentRepository::new(pg)),
            pool: Some(pool),
        }
    }

    /// Build a store over one shared in-memory database.
    pub fn memory(db: MemoryDatabase) -> Self {
        Self {
            memberships: Arc::new(db.clone()),
            roles: Arc::new(db.clone()),
            entitlements: Arc::new(db.clone()),
            revocations: Arc::new(db.clone()),
            refresh_sessions: Arc::new(db.clone()),
            ui_resources: Arc::new(db.clone()),
            students: Arc::new(db),
            pool: None,
        }
    }

    /// Short backend name for logs and health output.
    pub fn backend(&self) -> &'static str {
        if self.pool.is_some() { "postgres" } else { "memory" }
    }

    /// Check that the backing store answers.
    pub async fn health_check(&self) -> AppResult<bool> {
        match &self.pool {
            Some(pool) => pool.health_check().await,
            None => Ok(true),
        }
    }

    /// Close the connection pool, if any.
    pub async fn close(&self) {
        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}
