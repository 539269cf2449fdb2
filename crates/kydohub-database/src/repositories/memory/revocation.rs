use async_trait::async_trait;
use chrono::{DateTime, Utc};

use kydohub_core::result::AppResult;
use kydohub_core::types::TokenId;

use super::MemoryDatabase;
use crate::repositories::RevocationRepository;

#[async_trait]
impl RevocationRepository for MemoryDatabase {
    async fn insert(&self, jti: TokenId, expires_at: DateTime<Utc>) -> AppResult<()> {
        let mut state = self.state.lock().await;
        let entry = state.revoked.entry(jti).or_insert(expires_at);
        if *entry < expires_at {
            *entry = expires_at;
        }
        Ok(())
    }

    async fn is_revoked(&self, jti: TokenId, now: DateTime<Utc>) -> AppResult<bool> {
        let state = self.state.lock().await;
        Ok(state.revoked.get(&jti).is_some_and(|exp| *exp > now))
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let mut state = self.state.lock().await;
        let before = state.revoked.len();
        state.revoked.retain(|_, exp| *exp > now);
        Ok((before - state.revoked.len()) as u64)
    }
}
