//! Student entity model.

use chrono::{DateTime, Utc};
use kydohub_core::types::TenantId;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A child enrolled in a tenant.
///
/// Listings are always narrowed by the caller's data scope: staff see the
/// rooms they are assigned to, guardians see the students they are linked to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Student {
    /// Student id, referenced by guardianship attributes.
    pub id: String,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Display name.
    pub full_name: String,
    /// Room the student is assigned to.
    pub room_id: String,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

impl Student {
    /// Read a scoping column by name. Unknown columns read as `None`.
    pub fn column(&self, name: &str) -> Option<&str> {
        match name {
            "id" => Some(&self.id),
            "room_id" => Some(&self.room_id),
            "full_name" => Some(&self.full_name),
            _ => None,
        }
    }
}
