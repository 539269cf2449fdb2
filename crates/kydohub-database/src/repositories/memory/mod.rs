//! In-memory repository implementations for single-node development and tests.
//!
//! One [`MemoryDatabase`] implements every repository trait over shared
//! state guarded by a Tokio mutex, so a handle can be cloned into each slot
//! of a [`Store`](crate::Store) and all of them observe the same data.

mod entitlement;
mod membership;
mod refresh_session;
mod revocation;
mod role;
mod student;
mod ui_resource;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use kydohub_core::types::{SessionId, TenantId, TokenId, UserId};
use kydohub_entity::membership::Membership;
use kydohub_entity::role::Role;
use kydohub_entity::session::RefreshSession;
use kydohub_entity::student::Student;
use kydohub_entity::ui::UiResources;

/// Internal state for the in-memory database.
#[derive(Debug, Default)]
struct InnerState {
    memberships: HashMap<(TenantId, UserId), Membership>,
    /// Keyed by `(tenant, name)`; `None` tenant holds templates.
    roles: HashMap<(Option<TenantId>, String), Role>,
    versions: HashMap<(TenantId, UserId), i64>,
    revoked: HashMap<TokenId, DateTime<Utc>>,
    refresh_sessions: HashMap<SessionId, RefreshSession>,
    ui_resources: HashMap<TenantId, UiResources>,
    students: HashMap<(TenantId, String), Student>,
}

/// In-memory database implementing every repository trait.
#[derive(Debug, Clone, Default)]
pub struct MemoryDatabase {
    state: Arc<Mutex<InnerState>>,
}

impl MemoryDatabase {
    /// Create an empty in-memory database.
    pub fn new() -> Self {
        Self::default()
    }
}
