//! Route-level authorization declarations.

use std::collections::BTreeSet;

/// How a route's permission list is matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// Every listed permission is required.
    #[default]
    All,
    /// Any one listed permission suffices.
    Any,
}

/// What a protected route demands of the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteRequirement {
    /// Required permission strings, compared exactly.
    pub permissions: Vec<String>,
    /// Matching mode for `permissions`.
    pub mode: MatchMode,
    /// Resource whose data scope is attached to the context.
    pub resource: Option<String>,
    /// Whether the route mutates data. An empty scope is denied outright
    /// for write routes.
    pub write: bool,
}

impl RouteRequirement {
    /// Any authenticated member of the tenant.
    pub fn authenticated() -> Self {
        Self::default()
    }

    /// Every permission in `permissions` is required.
    pub fn all<I, S>(permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            permissions: permissions.into_iter().map(Into::into).collect(),
            mode: MatchMode::All,
            ..Self::default()
        }
    }

    /// At least one permission in `permissions` is required.
    pub fn any<I, S>(permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            permissions: permissions.into_iter().map(Into::into).collect(),
            mode: MatchMode::Any,
            ..Self::default()
        }
    }

    /// Attach the data scope of `resource`.
    pub fn scoped(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    /// Mark the route as write-class.
    pub fn write(mut self) -> Self {
        self.write = true;
        self
    }

    /// Whether `granted` satisfies the permission list.
    pub fn is_satisfied_by(&self, granted: &BTreeSet<String>) -> bool {
        if self.permissions.is_empty() {
            return true;
        }
        match self.mode {
            MatchMode::All => self.permissions.iter().all(|p| granted.contains(p)),
            MatchMode::Any => self.permissions.iter().any(|p| granted.contains(p)),
        }
    }
}
