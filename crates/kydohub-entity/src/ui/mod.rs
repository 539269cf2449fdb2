//! Tenant UI resource declarations.

pub mod model;

pub use model::{UiAction, UiPage, UiResources};
