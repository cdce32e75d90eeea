//! Error types for grid and geometry operations.

use thiserror::Error;

/// Result type alias using GridError.
pub type GridResult<T> = Result<T, GridError>;

/// Errors raised while building tile pyramids or parsing geometry input.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GridError {
    #[error("Unknown grid type: {0}. Must be one of: geodetic, mercator")]
    UnknownGrid(String),

    #[error("Invalid metatiling {0}: must be one of 1, 2, 4, 8, 16")]
    InvalidMetatiling(u32),

    #[error("Invalid bounds: {0}")]
    InvalidBounds(String),
}

impl GridError {
    /// Create an InvalidBounds error.
    pub fn invalid_bounds(msg: impl Into<String>) -> Self {
        Self::InvalidBounds(msg.into())
    }
}
