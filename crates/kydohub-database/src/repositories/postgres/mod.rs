//! PostgreSQL repository implementations.

pub mod entitlement;
pub mod membership;
pub mod refresh_session;
pub mod revocation;
pub mod role;
pub mod student;
pub mod ui_resource;

pub use entitlement::PgEntitlementRepository;
pub use membership::PgMembershipRepository;
pub use refresh_session::PgRefreshSessionRepository;
pub use revocation::PgRevocationRepository;
pub use role::PgRoleRepository;
pub use student::PgStudentRepository;
pub use ui_resource::PgUiResourceRepository;

use kydohub_core::error::{AppError, ErrorKind};

/// Wrap a sqlx error with a short description of the failed operation.
pub(crate) fn db_err(context: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| AppError::with_source(ErrorKind::Database, context, e)
}
