//! Axum middleware stack.

pub mod cors;
pub mod csrf;
pub mod guard;
pub mod logging;
pub mod rate_limit;
pub mod request_id;
