use async_trait::async_trait;
use chrono::{DateTime, Utc};

use kydohub_core::result::AppResult;
use kydohub_core::types::{FamilyId, SessionId, TenantId, UserId};
use kydohub_entity::session::{RefreshSession, RefreshSessionStatus};

use super::MemoryDatabase;
use crate::repositories::RefreshSessionRepository;

fn end(session: &mut RefreshSession, status: RefreshSessionStatus, now: DateTime<Utc>) {
    session.status = status;
    session.ended_at.get_or_insert(now);
}

fn revocable(session: &RefreshSession) -> bool {
    matches!(
        session.status,
        RefreshSessionStatus::Active | RefreshSessionStatus::Rotated
    )
}

#[async_trait]
impl RefreshSessionRepository for MemoryDatabase {
    async fn create(&self, session: &RefreshSession) -> AppResult<()> {
        let mut state = self.state.lock().await;
        state.refresh_sessions.insert(session.id, session.clone());
        Ok(())
    }

    async fn find_by_hash(&self, token_hash: &str) -> AppResult<Option<RefreshSession>> {
        let state = self.state.lock().await;
        Ok(state
            .refresh_sessions
            .values()
            .find(|s| s.token_hash == token_hash)
            .cloned())
    }

    async fn rotate(&self, old_id: SessionId, next: &RefreshSession) -> AppResult<bool> {
        let now = Utc::now();
        let mut state = self.state.lock().await;
        match state.refresh_sessions.get_mut(&old_id) {
            Some(old) if old.is_usable_at(now) => end(old, RefreshSessionStatus::Rotated, now),
            _ => return Ok(false),
        }
        state.refresh_sessions.insert(next.id, next.clone());
        Ok(true)
    }

    async fn revoke(&self, id: SessionId) -> AppResult<()> {
        let now = Utc::now();
        let mut state = self.state.lock().await;
        if let Some(session) = state.refresh_sessions.get_mut(&id) {
            if revocable(session) {
                end(session, RefreshSessionStatus::Revoked, now);
            }
        }
        Ok(())
    }

    async fn revoke_family(&self, family_id: FamilyId) -> AppResult<u64> {
        let now = Utc::now();
        let mut state = self.state.lock().await;
        let mut count = 0;
        for session in state.refresh_sessions.values_mut() {
            if session.family_id == family_id && revocable(session) {
                end(session, RefreshSessionStatus::Revoked, now);
                count += 1;
            }
        }
        Ok(count)
    }

    async fn revoke_all_for_user(&self, tenant_id: TenantId, user_id: UserId) -> AppResult<u64> {
        let now = Utc::now();
        let mut state = self.state.lock().await;
        let mut count = 0;
        for session in state.refresh_sessions.values_mut() {
            if session.tenant_id == tenant_id && session.user_id == user_id && revocable(session) {
                end(session, RefreshSessionStatus::Revoked, now);
                count += 1;
            }
        }
        Ok(count)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let mut state = self.state.lock().await;
        let before = state.refresh_sessions.len();
        state.refresh_sessions.retain(|_, s| !s.is_expired_at(now));
        Ok((before - state.refresh_sessions.len()) as u64)
    }
}
