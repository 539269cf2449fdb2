//! Role entity model.

use chrono::{DateTime, Utc};
use kydohub_core::types::TenantId;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A named list of `resource.action` permission strings.
///
/// A role with no `tenant_id` is a default template shared by every tenant;
/// a tenant-scoped role of the same name shadows it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Role {
    /// Owning tenant, or `None` for a default template.
    pub tenant_id: Option<TenantId>,
    /// Role name, unique within its scope.
    pub name: String,
    /// Permission strings granted by the role.
    pub permissions: Vec<String>,
    /// When the permission list was last changed.
    pub updated_at: DateTime<Utc>,
}

impl Role {
    /// Build a role with the given permissions.
    pub fn new(tenant_id: Option<TenantId>, name: impl Into<String>, permissions: Vec<String>) -> Self {
        Self {
            tenant_id,
            name: name.into(),
            permissions,
            updated_at: Utc::now(),
        }
    }

    /// Whether this role is a default template.
    pub fn is_template(&self) -> bool {
        self.tenant_id.is_none()
    }

    /// Permission strings trimmed, with blanks skipped.
    pub fn normalized_permissions(&self) -> impl Iterator<Item = &str> {
        self.permissions
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
    }
}
