//! Tenant membership entities.

pub mod model;
pub mod status;

pub use model::{Membership, MembershipAttributes};
pub use status::MembershipStatus;
