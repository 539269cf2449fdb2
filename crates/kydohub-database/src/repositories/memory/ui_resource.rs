use async_trait::async_trait;

use kydohub_core::result::AppResult;
use kydohub_core::types::TenantId;
use kydohub_entity::ui::UiResources;

use super::MemoryDatabase;
use crate::repositories::UiResourceRepository;

#[async_trait]
impl UiResourceRepository for MemoryDatabase {
    async fn get(&self, tenant_id: TenantId) -> AppResult<UiResources> {
        let state = self.state.lock().await;
        Ok(state.ui_resources.get(&tenant_id).cloned().unwrap_or_default())
    }

    async fn put(&self, tenant_id: TenantId, resources: &UiResources) -> AppResult<()> {
        let mut state = self.state.lock().await;
        state.ui_resources.insert(tenant_id, resources.clone());
        Ok(())
    }
}
