use async_trait::async_trait;
use chrono::Utc;

use kydohub_core::result::AppResult;
use kydohub_core::types::{TenantId, UserId};
use kydohub_entity::membership::{Membership, MembershipStatus};

use super::MemoryDatabase;
use crate::repositories::MembershipRepository;

#[async_trait]
impl MembershipRepository for MemoryDatabase {
    async fn find(&self, tenant_id: TenantId, user_id: UserId) -> AppResult<Option<Membership>> {
        let state = self.state.lock().await;
        Ok(state.memberships.get(&(tenant_id, user_id)).cloned())
    }

    async fn list_for_user(&self, user_id: UserId) -> AppResult<Vec<Membership>> {
        let state = self.state.lock().await;
        let mut found: Vec<_> = state
            .memberships
            .values()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .collect();
        found.sort_by_key(|m| m.created_at);
        Ok(found)
    }

    async fn list_active_by_role(&self, tenant_id: TenantId, role: &str) -> AppResult<Vec<Membership>> {
        let state = self.state.lock().await;
        Ok(state
            .memberships
            .values()
            .filter(|m| m.tenant_id == tenant_id && m.is_active() && m.roles.iter().any(|r| r == role))
            .cloned()
            .collect())
    }

    async fn upsert(&self, membership: &Membership) -> AppResult<()> {
        let mut state = self.state.lock().await;
        state
            .memberships
            .insert((membership.tenant_id, membership.user_id), membership.clone());
        Ok(())
    }

    async fn set_roles(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        roles: &[String],
    ) -> AppResult<Option<Membership>> {
        let mut state = self.state.lock().await;
        Ok(state.memberships.get_mut(&(tenant_id, user_id)).map(|m| {
            m.roles = roles.to_vec();
            m.updated_at = Utc::now();
            m.clone()
        }))
    }

    async fn set_status(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        status: MembershipStatus,
    ) -> AppResult<Option<Membership>> {
        let mut state = self.state.lock().await;
        Ok(state.memberships.get_mut(&(tenant_id, user_id)).map(|m| {
            m.status = status;
            m.updated_at = Utc::now();
            m.clone()
        }))
    }
}
