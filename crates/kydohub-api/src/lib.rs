//! # kydohub-api
//!
//! HTTP API layer for KydoHub built on Axum.
//!
//! Provides the session-lifecycle endpoints, tenant-scoped resource routes,
//! the per-route guard middleware, CSRF double-submit checks, rate limiting,
//! cookie handling, request ids, and error mapping.

pub mod app;
pub mod cookies;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{build_app, build_state};
pub use error::ApiError;
pub use state::AppState;
