//! Membership entity model.

use chrono::{DateTime, Utc};
use kydohub_core::types::{TenantId, UserId};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::status::MembershipStatus;

/// Attribute bag attached to a membership, used for data scoping.
///
/// Staff are scoped to the rooms they are assigned to; guardians to the
/// students they are linked to. Unknown keys are kept so tenants can carry
/// extra hints without a schema change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MembershipAttributes {
    /// Room ids the member is assigned to.
    #[serde(default)]
    pub rooms: Vec<String>,
    /// Student ids the member is a guardian of.
    #[serde(default, rename = "guardianOf")]
    pub guardian_of: Vec<String>,
    /// Attributes that do not drive scoping.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl MembershipAttributes {
    /// Room ids with surrounding whitespace removed and blanks dropped.
    pub fn room_ids(&self) -> impl Iterator<Item = &str> {
        normalized(&self.rooms)
    }

    /// Guarded student ids with surrounding whitespace removed and blanks dropped.
    pub fn guardian_student_ids(&self) -> impl Iterator<Item = &str> {
        normalized(&self.guardian_of)
    }
}

fn normalized(values: &[String]) -> impl Iterator<Item = &str> {
    values.iter().map(|v| v.trim()).filter(|v| !v.is_empty())
}

/// Association of a user to a tenant, with role names and attributes.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Membership {
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Member.
    pub user_id: UserId,
    /// Role names held in this tenant.
    pub roles: Vec<String>,
    /// Lifecycle state.
    pub status: MembershipStatus,
    /// Scoping attributes.
    #[sqlx(json)]
    pub attrs: MembershipAttributes,
    /// When the membership was created.
    pub created_at: DateTime<Utc>,
    /// When the membership was last modified.
    pub updated_at: DateTime<Utc>,
}

impl Membership {
    /// Build a fresh active membership.
    pub fn active(
        tenant_id: TenantId,
        user_id: UserId,
        roles: Vec<String>,
        attrs: MembershipAttributes,
    ) -> Self {
        let now = Utc::now();
        Self {
            tenant_id,
            user_id,
            roles,
            status: MembershipStatus::Active,
            attrs,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether this membership authorizes requests.
    pub fn is_active(&self) -> bool {
        self.status.grants_access()
    }

    /// Whether the membership holds the given role.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r.trim() == role)
    }
}
