//! Shared error type.

use thiserror::Error;

/// The top-level error type for `bz-core`.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown team color {0:?}")]
    UnknownColor(String),
}

/// Shorthand result type for `bz-core`.
pub type CoreResult<T> = Result<T, CoreError>;
