//! # kydohub-auth
//!
//! The session and authorization guard pipeline for KydoHub.
//!
//! ## Modules
//!
//! - `token` — session token signing/verification and identity provider exchange tokens
//! - `revocation` — revoked token ids, cache-first with a durable fallback
//! - `entitlement` — per-member entitlement versions (EV)
//! - `resolver` — membership and role expansion into a flat permission set
//! - `permset` — TTL cache of resolved permission sets with single-flight recomputation
//! - `scope` — ABAC data-scope derivation
//! - `guard` — the per-request orchestrator and the resulting `AuthContext`
//! - `session` — exchange, refresh rotation, logout, tenant switch
//! - `admin` — role and membership administration with EV bumps
//! - `cleanup` — periodic purge of lapsed revocations and refresh sessions

pub mod admin;
pub mod cleanup;
pub mod entitlement;
pub mod guard;
pub mod permset;
pub mod resolver;
pub mod revocation;
pub mod scope;
pub mod session;
pub mod token;

#[cfg(test)]
mod testing;

pub use admin::AccessAdmin;
pub use cleanup::Housekeeping;
pub use entitlement::EvStore;
pub use guard::{AuthContext, Guard, MatchMode, RouteRequirement, ScopedQuery};
pub use permset::PermissionCache;
pub use resolver::{EntitlementSource, Entitlements, MembershipResolver};
pub use revocation::RevocationStore;
pub use scope::ScopeBuilder;
pub use session::{ExchangeOutcome, IssuedSession, SessionManager, with_refresh_retry};
pub use token::{Claims, IdentityVerifier, TokenCodec, TokenError};
