//! # kydohub-entity
//!
//! Domain entity models for KydoHub. Every struct in this crate represents
//! a database row or a domain value object. Database entities derive
//! `sqlx::FromRow`; the in-memory repositories store the same types.

pub mod membership;
pub mod role;
pub mod session;
pub mod student;
pub mod ui;
