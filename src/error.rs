//! Error types for the implicit AVL tree.

use bytemuck::PodCastError;
use thiserror::Error;

/// Result type alias using AvlError.
pub type Result<T> = std::result::Result<T, AvlError>;

/// Errors that can occur while building or mutating a tree.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AvlError {
    // Capacity errors
    #[error("Capacity exceeded: slot {index} is beyond capacity {capacity}")]
    CapacityExceeded { index: usize, capacity: usize },

    // Structural errors
    #[error("Invariant violation at slot {index}: {violation}")]
    InvariantViolation { index: usize, violation: Violation },

    // Buffer errors
    #[error("Invalid buffer layout: {0:?}")]
    InvalidLayout(PodCastError),

    #[error("Buffer too small: expected {expected} slots, got {actual}")]
    BufferTooSmall { expected: usize, actual: usize },

    // Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<PodCastError> for AvlError {
    fn from(error: PodCastError) -> Self {
        AvlError::InvalidLayout(error)
    }
}

/// The invariant a slot failed to satisfy.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    #[error("occupied slot has an empty parent")]
    Orphaned,

    #[error("key is out of order")]
    KeyOrder,

    #[error("stored height {stored}, expected {expected}")]
    HeightMismatch { stored: i32, expected: i32 },

    #[error("balance factor {0} is outside [-1, 1]")]
    Unbalanced(i32),

    #[error("size is {stored}, counted {counted} occupied slots")]
    SizeMismatch { stored: usize, counted: usize },
}
