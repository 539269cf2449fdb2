//! Session lifecycle: exchange, refresh rotation, logout, tenant switch.

pub mod manager;
pub mod refresh_token;
pub mod retry;

pub use manager::{ExchangeOutcome, IssuedSession, SessionManager};
pub use retry::with_refresh_retry;
