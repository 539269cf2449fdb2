//! UI resource repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::types::Json;

use kydohub_core::result::AppResult;
use kydohub_core::types::TenantId;
use kydohub_entity::ui::{UiAction, UiPage, UiResources};

use super::db_err;
use crate::repositories::UiResourceRepository;

type UiRow = (Json<Vec<UiPage>>, Json<Vec<UiAction>>, Json<std::collections::BTreeMap<String, bool>>);

/// PostgreSQL-backed UI resource declarations.
#[derive(Debug, Clone)]
pub struct PgUiResourceRepository {
    pool: PgPool,
}

impl PgUiResourceRepository {
    /// Create a new UI resource repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UiResourceRepository for PgUiResourceRepository {
    async fn get(&self, tenant_id: TenantId) -> AppResult<UiResources> {
        let row = sqlx::query_as::<_, UiRow>(
            "SELECT pages, actions, feature_flags FROM ui_resources WHERE tenant_id = $1",
        )
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("Failed to load UI resources"))?;

        Ok(match row {
            Some((Json(pages), Json(actions), Json(feature_flags))) => UiResources {
                pages,
                actions,
                feature_flags,
            },
            None => UiResources::default(),
        })
    }

    async fn put(&self, tenant_id: TenantId, resources: &UiResources) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO ui_resources (tenant_id, pages, actions, feature_flags) VALUES ($1, $2, $3, $4) \
             ON CONFLICT (tenant_id) DO UPDATE SET pages = EXCLUDED.pages, actions = EXCLUDED.actions, \
               feature_flags = EXCLUDED.feature_flags, updated_at = NOW()",
        )
        .bind(tenant_id)
        .bind(Json(&resources.pages))
        .bind(Json(&resources.actions))
        .bind(Json(&resources.feature_flags))
        .execute(&self.pool)
        .await
        .map_err(db_err("Failed to store UI resources"))?;
        Ok(())
    }
}
