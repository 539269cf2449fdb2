//! The guard pipeline.
//!
//! Each step either passes the request on or ends it with one error kind:
//!
//! 1. credential present, else `Unauthenticated`
//! 2. token verifies, else `Unauthenticated` / `TokenExpired`
//! 3. token id not revoked, else `Unauthenticated`
//! 4. token EV not behind the member's EV, else `StalePermissions`
//! 5. active membership resolves, else `PermissionDenied`
//! 6. route permissions satisfied, else `PermissionDenied`
//! 7. data scope built for the route's resource
//! 8. tenant taken from the token into the context
//!
//! The guard never retries; refreshing after a stale or expired token is
//! the caller's job.

use std::sync::Arc;

use tracing::{debug, warn};

use kydohub_core::error::AppError;
use kydohub_core::result::AppResult;
use kydohub_core::types::DataScope;

use crate::entitlement::EvStore;
use crate::permset::PermissionCache;
use crate::revocation::RevocationStore;
use crate::scope::ScopeBuilder;
use crate::token::TokenCodec;

use super::context::AuthContext;
use super::requirement::RouteRequirement;

/// Message for a missing credential.
pub const AUTH_REQUIRED_MESSAGE: &str = "Authentication required.";
/// Message for an invalid or revoked credential.
pub const INVALID_SESSION_MESSAGE: &str = "Invalid session.";
/// Message for a stale credential.
pub const STALE_MESSAGE: &str = "Your permissions have changed. Refresh your session.";
/// Message for every permission or scope denial.
pub const FORBIDDEN_MESSAGE: &str = "You do not have permission to perform this action.";

/// Runs the full authorization chain for one request.
#[derive(Clone)]
pub struct Guard {
    codec: Arc<TokenCodec>,
    revocations: RevocationStore,
    versions: EvStore,
    permsets: PermissionCache,
    scopes: ScopeBuilder,
}

impl std::fmt::Debug for Guard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Guard").finish_non_exhaustive()
    }
}

impl Guard {
    /// Creates a new guard.
    pub fn new(
        codec: Arc<TokenCodec>,
        revocations: RevocationStore,
        versions: EvStore,
        permsets: PermissionCache,
        scopes: ScopeBuilder,
    ) -> Self {
        Self {
            codec,
            revocations,
            versions,
            permsets,
            scopes,
        }
    }

    /// Authorize a request carrying `credential` against `requirement`.
    pub async fn authorize(
        &self,
        credential: Option<&str>,
        requirement: &RouteRequirement,
        request_id: Option<String>,
    ) -> AppResult<AuthContext> {
        let token = credential
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::unauthenticated(AUTH_REQUIRED_MESSAGE))?;

        let claims = self.codec.verify(token).map_err(AppError::from)?;

        if self.revocations.is_revoked(claims.jti).await {
            debug!(jti = %claims.jti, "Rejected revoked token");
            return Err(AppError::unauthenticated(INVALID_SESSION_MESSAGE));
        }

        let server_ev = self.versions.current(claims.tid, claims.sub).await;
        if server_ev.is_some_and(|server_ev| claims.ev < server_ev) {
            debug!(
                tenant_id = %claims.tid,
                user_id = %claims.sub,
                token_ev = claims.ev,
                server_ev = ?server_ev,
                "Rejected stale token"
            );
            return Err(AppError::stale_permissions(STALE_MESSAGE));
        }

        let entitlements = self
            .permsets
            .get_or_compute(claims.tid, claims.sub, Some(server_ev.unwrap_or(claims.ev)))
            .await?;

        if !requirement.is_satisfied_by(&entitlements.permissions) {
            debug!(
                tenant_id = %claims.tid,
                user_id = %claims.sub,
                required = ?requirement.permissions,
                "Missing route permission"
            );
            return Err(AppError::permission_denied(FORBIDDEN_MESSAGE));
        }

        let scope = match &requirement.resource {
            Some(resource) => self.scopes.build(resource, &entitlements),
            None => DataScope::Unrestricted,
        };
        if requirement.write && scope.is_empty() {
            warn!(
                tenant_id = %claims.tid,
                user_id = %claims.sub,
                "Write denied on empty data scope"
            );
            return Err(AppError::permission_denied(FORBIDDEN_MESSAGE));
        }

        Ok(AuthContext {
            request_id,
            tenant_id: claims.tid,
            user_id: claims.sub,
            roles: entitlements.roles.clone(),
            permissions: entitlements.permissions.clone(),
            attrs: entitlements.attrs.clone(),
            scope,
            ev: claims.ev,
            jti: claims.jti,
            expires_at: claims.expires_at(),
        })
    }
}
