//! Response DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use kydohub_auth::IssuedSession;
use kydohub_core::types::{TenantId, UserId};
use kydohub_entity::membership::{Membership, MembershipAttributes, MembershipStatus};
use kydohub_entity::student::Student;
use kydohub_entity::ui::UiResources;

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Token pair handed to mobile clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionTokensResponse {
    /// Access token.
    pub access: String,
    /// Refresh token.
    pub refresh: String,
    /// Access token expiry.
    pub access_expires_at: DateTime<Utc>,
    /// Refresh token expiry.
    pub refresh_expires_at: DateTime<Utc>,
    /// Session tenant.
    pub tenant_id: TenantId,
    /// Session user.
    pub user_id: UserId,
    /// EV in the access token.
    pub ev: i64,
}

impl From<IssuedSession> for SessionTokensResponse {
    fn from(s: IssuedSession) -> Self {
        Self {
            access: s.access_token,
            refresh: s.refresh_token,
            access_expires_at: s.access_expires_at,
            refresh_expires_at: s.refresh_expires_at,
            tenant_id: s.tenant_id,
            user_id: s.user_id,
            ev: s.ev,
        }
    }
}

/// Body of a 209 tenant-choice response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantChoiceResponse {
    /// Tenants the user may open a session in.
    pub tenants: Vec<TenantChoice>,
}

/// One selectable tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantChoice {
    /// Tenant id, to be sent back as `tenantHint`.
    #[serde(rename = "tenantId")]
    pub tenant_id: TenantId,
}

/// The caller's authorization context for the frontend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeContextResponse {
    /// Session tenant.
    pub tenant_id: TenantId,
    /// Session user.
    pub user_id: UserId,
    /// Role names.
    pub roles: Vec<String>,
    /// Sorted permission names.
    pub permissions: Vec<String>,
    /// ABAC attributes of the membership.
    pub attrs: MembershipAttributes,
    /// Pages, actions and feature flags.
    pub ui: UiResources,
    /// Session metadata.
    pub meta: ContextMeta,
}

/// Metadata block of [`MeContextResponse`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextMeta {
    /// EV the context was computed under.
    pub ev: i64,
    /// Correlation id of the request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Student listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentListResponse {
    /// Visible students.
    pub items: Vec<Student>,
    /// Number of items.
    pub total: usize,
}

impl From<Vec<Student>> for StudentListResponse {
    fn from(items: Vec<Student>) -> Self {
        Self {
            total: items.len(),
            items,
        }
    }
}

/// Result of ending all sessions of a member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogoutAllResponse {
    /// Affected user.
    pub user_id: UserId,
    /// EV after the bump.
    pub ev: i64,
}

/// Membership summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MembershipResponse {
    /// Tenant.
    pub tenant_id: TenantId,
    /// Member.
    pub user_id: UserId,
    /// Assigned roles.
    pub roles: Vec<String>,
    /// Membership status.
    pub status: MembershipStatus,
    /// Last change.
    pub updated_at: DateTime<Utc>,
}

impl From<Membership> for MembershipResponse {
    fn from(m: Membership) -> Self {
        Self {
            tenant_id: m.tenant_id,
            user_id: m.user_id,
            roles: m.roles,
            status: m.status,
            updated_at: m.updated_at,
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `ok` or `degraded`.
    pub status: String,
    /// Server version.
    pub version: String,
    /// Database backend state.
    pub database: String,
    /// Cache backend state.
    pub cache: String,
}
