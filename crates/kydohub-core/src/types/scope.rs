//! ABAC data scopes.
//!
//! A [`DataScope`] narrows the rows of a resource a caller may see inside
//! their tenant. A scope that is empty matches nothing.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Logical scope field for room-based visibility.
pub const ROOM_FIELD: &str = "room";
/// Logical scope field for guardianship-based visibility.
pub const STUDENT_FIELD: &str = "student";

/// Which rows of a resource a caller may see inside their tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "filters", rename_all = "snake_case")]
pub enum DataScope {
    /// Every row in the tenant.
    Unrestricted,
    /// Rows where at least one field holds one of its allowed values.
    Restricted(BTreeMap<String, BTreeSet<String>>),
    /// No rows at all.
    Empty,
}

impl DataScope {
    /// Build a restricted scope, collapsing to [`DataScope::Empty`] when no
    /// field has any allowed value.
    pub fn restricted(filters: BTreeMap<String, BTreeSet<String>>) -> Self {
        let filters: BTreeMap<_, _> = filters
            .into_iter()
            .filter(|(_, values)| !values.is_empty())
            .collect();
        if filters.is_empty() {
            Self::Empty
        } else {
            Self::Restricted(filters)
        }
    }

    /// Whether the scope can match no row.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Allowed values for one field, if the scope restricts it.
    pub fn allowed(&self, field: &str) -> Option<&BTreeSet<String>> {
        match self {
            Self::Restricted(filters) => filters.get(field),
            _ => None,
        }
    }

    /// Evaluate the scope against a row whose logical fields are read by `lookup`.
    pub fn matches<'a>(&self, lookup: impl Fn(&str) -> Option<&'a str>) -> bool {
        match self {
            Self::Unrestricted => true,
            Self::Empty => false,
            Self::Restricted(filters) => filters.iter().any(|(field, allowed)| {
                lookup(field).is_some_and(|value| allowed.contains(value))
            }),
        }
    }
}
