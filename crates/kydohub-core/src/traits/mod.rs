//! Core traits defined in `kydohub-core` and implemented by other crates.

pub mod cache;

pub use cache::CacheProvider;
