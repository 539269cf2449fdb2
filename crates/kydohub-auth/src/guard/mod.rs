//! Per-request authorization.

pub mod context;
pub mod orchestrator;
pub mod query;
pub mod requirement;

pub use context::AuthContext;
pub use orchestrator::Guard;
pub use query::ScopedQuery;
pub use requirement::{MatchMode, RouteRequirement};
