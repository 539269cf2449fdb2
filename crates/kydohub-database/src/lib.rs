//! # kydohub-database
//!
//! PostgreSQL connection management, repository traits, and their
//! PostgreSQL and in-memory implementations for every KydoHub entity the
//! guard pipeline reads or writes.

pub mod pool;
pub mod repositories;
pub mod store;

pub use pool::DatabasePool;
pub use store::Store;
