//! Convenience result type alias for KydoHub.

use crate::error::AppError;

/// A specialized `Result` type for KydoHub operations.
pub type AppResult<T> = Result<T, AppError>;
