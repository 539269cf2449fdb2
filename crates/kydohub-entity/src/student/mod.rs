//! Student records.

pub mod model;

pub use model::Student;
