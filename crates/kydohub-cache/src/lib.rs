//! # kydohub-cache
//!
//! The fast lookup layer in front of the authorization store: entitlement
//! versions, resolved permission sets and revocation markers.
//!
//! Every caller treats a cache error as a miss and falls back to the
//! database, so `provider = "none"` is a valid, slower deployment. The
//! in-process backend (moka) suits a single API instance; Redis shares state
//! across instances so a bump or revocation is seen everywhere at once.

pub mod keys;
#[cfg(feature = "memory")]
pub mod memory;
pub mod null;
pub mod provider;
#[cfg(feature = "redis-backend")]
pub mod redis;

pub use provider::CacheManager;
