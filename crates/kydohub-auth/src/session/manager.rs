//! Session issue, rotation and teardown.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use kydohub_core::config::auth::AuthConfig;
use kydohub_core::error::AppError;
use kydohub_core::result::AppResult;
use kydohub_core::types::{FamilyId, SessionId, TenantId, UserId};
use kydohub_database::Store;
use kydohub_database::repositories::{MembershipRepository, RefreshSessionRepository};
use kydohub_entity::session::{RefreshSession, RefreshSessionStatus};

use crate::entitlement::EvStore;
use crate::guard::orchestrator::INVALID_SESSION_MESSAGE;
use crate::permset::PermissionCache;
use crate::resolver::NO_ACCESS_MESSAGE;
use crate::revocation::{REVOCATION_BUFFER_SECS, RevocationStore};
use crate::token::{IdentityVerifier, TokenCodec};

use super::refresh_token;

/// A freshly minted access token and refresh token pair.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedSession {
    /// Signed access token.
    pub access_token: String,
    /// Access token expiry.
    pub access_expires_at: DateTime<Utc>,
    /// Opaque refresh token; only its hash is stored.
    pub refresh_token: String,
    /// Refresh session expiry.
    pub refresh_expires_at: DateTime<Utc>,
    /// Tenant the session is bound to.
    pub tenant_id: TenantId,
    /// Session owner.
    pub user_id: UserId,
    /// EV embedded in the access token.
    pub ev: i64,
}

/// Result of exchanging an identity provider token.
#[derive(Debug, Clone)]
pub enum ExchangeOutcome {
    /// A session was issued.
    Issued(IssuedSession),
    /// The user belongs to several tenants and gave no hint.
    ChooseTenant(Vec<TenantId>),
}

/// Issues, rotates and ends sessions.
#[derive(Clone)]
pub struct SessionManager {
    codec: Arc<TokenCodec>,
    identity: Arc<IdentityVerifier>,
    memberships: Arc<dyn MembershipRepository>,
    sessions: Arc<dyn RefreshSessionRepository>,
    revocations: RevocationStore,
    versions: EvStore,
    permsets: PermissionCache,
    refresh_ttl: Duration,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    /// Creates a new session manager.
    pub fn new(
        config: &AuthConfig,
        codec: Arc<TokenCodec>,
        store: &Store,
        revocations: RevocationStore,
        versions: EvStore,
        permsets: PermissionCache,
    ) -> Self {
        Self {
            identity: Arc::new(IdentityVerifier::new(
                &config.identity_provider,
                config.leeway_seconds,
            )),
            codec,
            memberships: store.memberships.clone(),
            sessions: store.refresh_sessions.clone(),
            revocations,
            versions,
            permsets,
            refresh_ttl: Duration::seconds(config.refresh_ttl_seconds as i64),
        }
    }

    /// Exchange a verified identity provider token for a KydoHub session.
    pub async fn exchange(
        &self,
        idp_token: &str,
        tenant_hint: Option<TenantId>,
        device: Option<String>,
    ) -> AppResult<ExchangeOutcome> {
        let identity = self.identity.verify(idp_token).map_err(|e| {
            debug!(error = %e, "Identity token rejected");
            AppError::unauthenticated(INVALID_SESSION_MESSAGE)
        })?;
        let user_id = identity.user_id().map_err(AppError::from)?;

        let mut tenants: Vec<TenantId> = self
            .memberships
            .list_for_user(user_id)
            .await?
            .into_iter()
            .filter(|m| m.is_active())
            .map(|m| m.tenant_id)
            .collect();
        tenants.sort();
        tenants.dedup();

        let tenant_id = match (tenant_hint, tenants.as_slice()) {
            (Some(hint), _) if tenants.contains(&hint) => hint,
            (Some(_), _) | (None, []) => {
                return Err(AppError::permission_denied(NO_ACCESS_MESSAGE));
            }
            (None, [only]) => *only,
            (None, many) => return Ok(ExchangeOutcome::ChooseTenant(many.to_vec())),
        };

        let issued = self.issue(tenant_id, user_id, FamilyId::new(), device).await?;
        info!(tenant_id = %tenant_id, user_id = %user_id, "Session exchanged");
        Ok(ExchangeOutcome::Issued(issued))
    }

    /// Rotate a refresh token into a new pair.
    ///
    /// Presenting a token that was already rotated ends its whole family
    /// and bumps the member's EV.
    pub async fn refresh(&self, presented: &str) -> AppResult<IssuedSession> {
        let now = Utc::now();
        let Some(current) = self
            .sessions
            .find_by_hash(&refresh_token::hash(presented))
            .await?
        else {
            return Err(AppError::unauthenticated(INVALID_SESSION_MESSAGE));
        };

        if current.status == RefreshSessionStatus::Rotated {
            self.handle_reuse(&current).await?;
            return Err(AppError::unauthenticated(INVALID_SESSION_MESSAGE));
        }
        if !current.is_usable_at(now) {
            return Err(AppError::unauthenticated(INVALID_SESSION_MESSAGE));
        }

        let active = self
            .memberships
            .find(current.tenant_id, current.user_id)
            .await?
            .is_some_and(|m| m.is_active());
        if !active {
            self.sessions.revoke(current.id).await?;
            return Err(AppError::permission_denied(NO_ACCESS_MESSAGE));
        }

        let token = refresh_token::generate();
        let next = self.new_session(
            current.family_id,
            current.tenant_id,
            current.user_id,
            &token,
            current.device.clone(),
        );
        if !self.sessions.rotate(current.id, &next).await? {
            debug!(session_id = %current.id, "Refresh lost a concurrent rotation");
            return Err(AppError::unauthenticated(INVALID_SESSION_MESSAGE));
        }

        let ev = self.versions.seed(current.tenant_id, current.user_id).await?;
        let (access_token, claims) = self
            .codec
            .mint(current.tenant_id, current.user_id, ev)
            .map_err(AppError::from)?;

        debug!(tenant_id = %current.tenant_id, user_id = %current.user_id, ev, "Session refreshed");
        Ok(IssuedSession {
            access_token,
            access_expires_at: claims.expires_at(),
            refresh_token: token,
            refresh_expires_at: next.expires_at,
            tenant_id: current.tenant_id,
            user_id: current.user_id,
            ev,
        })
    }

    /// End a session. Safe to call repeatedly.
    ///
    /// The access token id is revoked for its remaining lifetime plus a
    /// buffer, and the call fails unless that revocation is durable. An
    /// access token that no longer verifies is ignored.
    pub async fn logout(
        &self,
        access_token: Option<&str>,
        refresh: Option<&str>,
    ) -> AppResult<()> {
        if let Some(token) = refresh.filter(|t| !t.is_empty()) {
            let hash = refresh_token::hash(token);
            if let Some(session) = self.sessions.find_by_hash(&hash).await? {
                self.sessions.revoke(session.id).await?;
            }
        }

        if let Some(token) = access_token.filter(|t| !t.is_empty()) {
            match self.codec.verify(token) {
                Ok(claims) => {
                    let until = claims.expires_at() + Duration::seconds(REVOCATION_BUFFER_SECS);
                    self.revocations.revoke(claims.jti, until).await?;
                    info!(tenant_id = %claims.tid, user_id = %claims.sub, "Logged out");
                }
                Err(e) => debug!(error = %e, "Ignoring unverifiable access token on logout"),
            }
        }

        Ok(())
    }

    /// Issue a session for another tenant the caller is an active member of.
    pub async fn switch_tenant(
        &self,
        access_token: &str,
        target: TenantId,
    ) -> AppResult<IssuedSession> {
        let claims = self.codec.verify(access_token).map_err(AppError::from)?;
        if self.revocations.is_revoked(claims.jti).await {
            return Err(AppError::unauthenticated(INVALID_SESSION_MESSAGE));
        }

        let active = self
            .memberships
            .find(target, claims.sub)
            .await?
            .is_some_and(|m| m.is_active());
        if !active {
            return Err(AppError::permission_denied(NO_ACCESS_MESSAGE));
        }

        let issued = self.issue(target, claims.sub, FamilyId::new(), None).await?;
        info!(from = %claims.tid, to = %target, user_id = %claims.sub, "Tenant switched");
        Ok(issued)
    }

    async fn issue(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        family_id: FamilyId,
        device: Option<String>,
    ) -> AppResult<IssuedSession> {
        let ev = self.versions.seed(tenant_id, user_id).await?;

        let token = refresh_token::generate();
        let session = self.new_session(family_id, tenant_id, user_id, &token, device);
        self.sessions.create(&session).await?;

        let (access_token, claims) = self
            .codec
            .mint(tenant_id, user_id, ev)
            .map_err(AppError::from)?;

        Ok(IssuedSession {
            access_token,
            access_expires_at: claims.expires_at(),
            refresh_token: token,
            refresh_expires_at: session.expires_at,
            tenant_id,
            user_id,
            ev,
        })
    }

    fn new_session(
        &self,
        family_id: FamilyId,
        tenant_id: TenantId,
        user_id: UserId,
        token: &str,
        device: Option<String>,
    ) -> RefreshSession {
        let now = Utc::now();
        RefreshSession {
            id: SessionId::new(),
            family_id,
            tenant_id,
            user_id,
            token_hash: refresh_token::hash(token),
            status: RefreshSessionStatus::Active,
            device,
            created_at: now,
            expires_at: now + self.refresh_ttl,
            ended_at: None,
        }
    }

    /// Stale every access token of the member, then end the family.
    ///
    /// Errors with `DependencyUnavailable` when either step could not be
    /// recorded, so the client sees that the compromise was not contained.
    async fn handle_reuse(&self, session: &RefreshSession) -> AppResult<()> {
        warn!(
            event = "refresh_token_reuse_detected",
            tenant_id = %session.tenant_id,
            user_id = %session.user_id,
            family_id = %session.family_id,
            "Rotated refresh token presented again; ending token family"
        );

        let bumped = self.versions.bump(session.tenant_id, session.user_id).await;
        if bumped.is_ok() {
            self.permsets
                .invalidate(session.tenant_id, session.user_id)
                .await;
        }
        let revoked = self.sessions.revoke_family(session.family_id).await;

        if let Some(e) = bumped.err().or(revoked.err()) {
            error!(
                event = "refresh_token_reuse_detected",
                family_id = %session.family_id,
                user_id = %session.user_id,
                error = %e,
                "Token family could not be fully ended after reuse"
            );
            return Err(AppError::with_source(
                kydohub_core::ErrorKind::DependencyUnavailable,
                "Could not end session",
                e,
            ));
        }
        Ok(())
    }
}
