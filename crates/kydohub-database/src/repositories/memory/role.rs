use async_trait::async_trait;
use chrono::Utc;

use kydohub_core::result::AppResult;
use kydohub_core::types::TenantId;
use kydohub_entity::role::Role;

use super::MemoryDatabase;
use crate::repositories::RoleRepository;

#[async_trait]
impl RoleRepository for MemoryDatabase {
    async fn find_by_names(&self, tenant_id: TenantId, names: &[String]) -> AppResult<Vec<Role>> {
        let state = self.state.lock().await;
        let mut found = Vec::new();
        for name in names {
            let role = state
                .roles
                .get(&(Some(tenant_id), name.clone()))
                .or_else(|| state.roles.get(&(None, name.clone())));
            if let Some(role) = role {
                if !found.iter().any(|r: &Role| r.name == role.name) {
                    found.push(role.clone());
                }
            }
        }
        Ok(found)
    }

    async fn upsert(&self, role: &Role) -> AppResult<()> {
        let mut state = self.state.lock().await;
        state
            .roles
            .insert((role.tenant_id, role.name.clone()), role.clone());
        Ok(())
    }

    async fn set_permissions(
        &self,
        tenant_id: TenantId,
        name: &str,
        permissions: &[String],
    ) -> AppResult<Role> {
        let mut state = self.state.lock().await;
        let role = Role {
            tenant_id: Some(tenant_id),
            name: name.to_string(),
            permissions: permissions.to_vec(),
            updated_at: Utc::now(),
        };
        state
            .roles
            .insert((Some(tenant_id), name.to_string()), role.clone());
        Ok(role)
    }
}
