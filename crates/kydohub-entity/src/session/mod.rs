//! Refresh session entities.

pub mod model;
pub mod status;

pub use model::RefreshSession;
pub use status::RefreshSessionStatus;
