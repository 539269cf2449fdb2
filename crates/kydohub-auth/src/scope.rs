//! ABAC data scopes.

use std::collections::{BTreeMap, BTreeSet};

use kydohub_core::config::authorization::AuthorizationConfig;
use kydohub_core::types::scope::{ROOM_FIELD, STUDENT_FIELD};
use kydohub_core::types::DataScope;

use crate::resolver::Entitlements;

/// Derives the rows of a resource a member may see.
///
/// Pure and synchronous: the result depends only on the resolved
/// entitlements. Without an unrestricted permission or any scoping
/// attribute the scope is [`DataScope::Empty`].
#[derive(Debug, Clone)]
pub struct ScopeBuilder {
    unrestricted_suffix: String,
}

impl ScopeBuilder {
    /// Creates a scope builder.
    pub fn new(config: &AuthorizationConfig) -> Self {
        Self {
            unrestricted_suffix: config.unrestricted_suffix.clone(),
        }
    }

    /// Permission that lifts every attribute filter on `resource`.
    pub fn unrestricted_permission(&self, resource: &str) -> String {
        format!("{resource}.{}", self.unrestricted_suffix)
    }

    /// Build the scope of `resource` for a member.
    pub fn build(&self, resource: &str, entitlements: &Entitlements) -> DataScope {
        if entitlements.has(&self.unrestricted_permission(resource)) {
            return DataScope::Unrestricted;
        }

        let attrs = &entitlements.attrs;
        let mut filters = BTreeMap::new();
        filters.insert(
            ROOM_FIELD.to_string(),
            attrs.room_ids().map(str::to_string).collect::<BTreeSet<_>>(),
        );
        filters.insert(
            STUDENT_FIELD.to_string(),
            attrs
                .guardian_student_ids()
                .map(str::to_string)
                .collect::<BTreeSet<_>>(),
        );
        DataScope::restricted(filters)
    }
}
