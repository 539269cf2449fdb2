//! Session token claims.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use kydohub_core::types::{TenantId, TokenId, UserId};

/// Claims carried by every session (access) token.
///
/// All fields are required; a token missing any of them does not verify.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id.
    pub sub: UserId,
    /// Tenant the session is bound to.
    pub tid: TenantId,
    /// Entitlement version at issue time.
    pub ev: i64,
    /// Token id, used for revocation.
    pub jti: TokenId,
    /// Issued-at, seconds since epoch.
    pub iat: i64,
    /// Expiry, seconds since epoch.
    pub exp: i64,
    /// Audience.
    pub aud: String,
    /// Issuer.
    pub iss: String,
}

impl Claims {
    /// Returns the expiration as a `DateTime<Utc>`.
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or_else(Utc::now)
    }
}
