//! # kydohub-core
//!
//! Core crate for KydoHub. Contains the unified error system, typed
//! identifiers, the cache provider trait, and the configuration schema.
//!
//! This crate has **no** internal dependencies on other KydoHub crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
