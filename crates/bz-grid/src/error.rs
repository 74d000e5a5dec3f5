//! Grid-subsystem error type.

use thiserror::Error;

/// Errors produced by `bz-grid`.
///
/// All of these are configuration-time rejections.  Out-of-range cell
/// coordinates are caller bugs and panic instead.
#[derive(Debug, Error)]
pub enum GridError {
    #[error("{what} rate must lie strictly inside (0, 1), got {value}")]
    InvalidRate { what: &'static str, value: f64 },

    #[error("prior probability must lie strictly inside (0, 1), got {0}")]
    InvalidPrior(f64),

    #[error("grid dimensions must be non-zero, got {rows}x{cols}")]
    EmptyGrid { rows: usize, cols: usize },

    #[error("observation block expects {expected} cells, got {got}")]
    BlockShape { expected: usize, got: usize },
}

pub type GridResult<T> = Result<T, GridError>;
