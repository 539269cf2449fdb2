//! Tenant-bound data access for route handlers.

use kydohub_core::result::AppResult;
use kydohub_core::types::{DataScope, TenantId};
use kydohub_database::repositories::StudentRepository;
use kydohub_entity::student::Student;

/// The verified tenant plus the caller's data scope.
///
/// Only [`AuthContext::scoped_query`](super::AuthContext::scoped_query)
/// builds one, so the tenant can never come from request input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopedQuery {
    tenant_id: TenantId,
    scope: DataScope,
}

impl ScopedQuery {
    pub(crate) fn new(tenant_id: TenantId, scope: DataScope) -> Self {
        Self { tenant_id, scope }
    }

    /// The tenant every row must belong to.
    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// The data scope inside the tenant.
    pub fn scope(&self) -> &DataScope {
        &self.scope
    }

    /// Students visible to the caller, ordered by name.
    pub async fn students(&self, repo: &dyn StudentRepository) -> AppResult<Vec<Student>> {
        repo.list(self.tenant_id, &self.scope).await
    }
}
