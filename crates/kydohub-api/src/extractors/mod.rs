//! Custom Axum extractors.

pub mod auth;
pub mod client;
pub mod credential;
