//! Redis backend: one reconnecting connection and the provider over it.

pub mod client;
pub mod operations;

pub use client::RedisClient;
pub use operations::RedisCacheProvider;
