use async_trait::async_trait;

use kydohub_core::result::AppResult;
use kydohub_core::types::{TenantId, UserId};

use super::MemoryDatabase;
use crate::repositories::{EV_BASELINE, EntitlementRepository};

#[async_trait]
impl EntitlementRepository for MemoryDatabase {
    async fn current(&self, tenant_id: TenantId, user_id: UserId) -> AppResult<Option<i64>> {
        let state = self.state.lock().await;
        Ok(state.versions.get(&(tenant_id, user_id)).copied())
    }

    async fn ensure_baseline(&self, tenant_id: TenantId, user_id: UserId) -> AppResult<i64> {
        let mut state = self.state.lock().await;
        Ok(*state
            .versions
            .entry((tenant_id, user_id))
            .or_insert(EV_BASELINE))
    }

    async fn bump(&self, tenant_id: TenantId, user_id: UserId) -> AppResult<i64> {
        let mut state = self.state.lock().await;
        let version = state
            .versions
            .entry((tenant_id, user_id))
            .and_modify(|v| *v += 1)
            .or_insert(EV_BASELINE + 1);
        Ok(*version)
    }
}
