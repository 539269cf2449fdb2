//! Refresh session entity model.

use chrono::{DateTime, Utc};
use kydohub_core::types::{FamilyId, SessionId, TenantId, UserId};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::status::RefreshSessionStatus;

/// A long-lived refresh session.
///
/// Only the SHA-256 hash of the opaque refresh token is stored. Every
/// session created by rotation shares the `family_id` of the login that
/// started the chain, so reuse of one rotated token can end the whole chain.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RefreshSession {
    /// Unique session identifier.
    pub id: SessionId,
    /// Rotation chain this session belongs to.
    pub family_id: FamilyId,
    /// Tenant the session was issued for.
    pub tenant_id: TenantId,
    /// Session owner.
    pub user_id: UserId,
    /// Hex-encoded SHA-256 of the refresh token.
    pub token_hash: String,
    /// Lifecycle state.
    pub status: RefreshSessionStatus,
    /// Client-supplied device label.
    pub device: Option<String>,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// Absolute expiry.
    pub expires_at: DateTime<Utc>,
    /// When the session left the active state.
    pub ended_at: Option<DateTime<Utc>>,
}

impl RefreshSession {
    /// Whether the session has passed its expiry at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Whether the session can be rotated at `now`.
    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        self.status == RefreshSessionStatus::Active && !self.is_expired_at(now)
    }
}
