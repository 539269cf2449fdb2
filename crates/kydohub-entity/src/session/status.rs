//! Refresh session status enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a refresh session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "refresh_session_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RefreshSessionStatus {
    /// Can be exchanged for a new token pair exactly once.
    Active,
    /// Already exchanged; presenting it again signals token theft.
    Rotated,
    /// Ended by logout, reuse detection, or an administrator.
    Revoked,
    /// Passed its expiry.
    Expired,
}

impl RefreshSessionStatus {
    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Rotated => "rotated",
            Self::Revoked => "revoked",
            Self::Expired => "expired",
        }
    }
}

impl fmt::Display for RefreshSessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
