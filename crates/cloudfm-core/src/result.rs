//! Convenience result type alias for cloudfm.

use crate::error::AppError;

/// A specialized `Result` type for cloudfm operations.
pub type AppResult<T> = Result<T, AppError>;
