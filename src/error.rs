//! Error types for sparse-rep

use crate::dtype::DType;
use thiserror::Error;

/// Result type alias using sparse-rep's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Recoverable errors reported by allocation, transfer and builder operations
///
/// Contract violations (reading a representation that is not bound, binding two
/// formats to one tensor) are not represented here; they panic.
#[derive(Error, Debug)]
pub enum Error {
    /// Shape mismatch in an operation
    #[error("Shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        /// Expected shape
        expected: Vec<usize>,
        /// Actual shape
        got: Vec<usize>,
    },

    /// DType mismatch between operands
    #[error("DType mismatch: {lhs:?} vs {rhs:?}")]
    DTypeMismatch {
        /// Expected dtype
        lhs: DType,
        /// Actual dtype
        rhs: DType,
    },

    /// Allocator could not satisfy a request
    #[error("Out of memory: allocator '{allocator}' failed to allocate {size} bytes")]
    OutOfMemory {
        /// Name of the memory the allocator serves
        allocator: String,
        /// Requested size in bytes
        size: usize,
    },

    /// Invalid argument provided to an operation
    #[error("Invalid argument '{arg}': {reason}")]
    InvalidArgument {
        /// The argument name
        arg: &'static str,
        /// Reason for invalidity
        reason: String,
    },

    /// Index out of bounds
    #[error("Index {index} out of bounds for dimension of size {size}")]
    IndexOutOfBounds {
        /// The invalid index
        index: i64,
        /// Size of the dimension
        size: usize,
    },

    /// Index buffers are structurally inconsistent
    #[error("Invalid {format} indices: {reason}")]
    InvalidIndices {
        /// Format whose indices failed validation
        format: &'static str,
        /// What was wrong
        reason: String,
    },

    /// No registered transfer can move data between the two memory kinds
    #[error("No data transfer registered from {src} to {dst}")]
    UnsupportedTransfer {
        /// Source memory description
        src: String,
        /// Destination memory description
        dst: String,
    },

    /// Host access requested for memory the host cannot address
    #[error("Memory '{memory}' is not host accessible")]
    NotHostAccessible {
        /// Memory description
        memory: String,
    },
}

impl Error {
    /// Create a shape mismatch error
    pub fn shape_mismatch(expected: &[usize], got: &[usize]) -> Self {
        Self::ShapeMismatch {
            expected: expected.to_vec(),
            got: got.to_vec(),
        }
    }

    /// Create an invalid indices error
    pub fn invalid_indices(format: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidIndices {
            format,
            reason: reason.into(),
        }
    }

    /// Create an invalid argument error
    pub fn invalid_argument(arg: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            arg,
            reason: reason.into(),
        }
    }
}
