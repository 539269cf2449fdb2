//! Core type definitions used across the KydoHub workspace.

pub mod id;
pub mod scope;

pub use id::*;
pub use scope::DataScope;
