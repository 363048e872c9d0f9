//! # sparse-rep
//!
//! **Sparse tensors with interchangeable compressed representations.**
//!
//! A [`SparseTensor`](sparse::SparseTensor) stores a dense shape, its
//! non-zero values and one bound encoding (COO or CSR/CSC). Buffers are
//! either allocator-owned or alias caller memory, and a tensor can be deep
//! copied to any allocator through a pluggable data-transfer layer.
//!
//! ## Modules
//!
//! - [`tensor`]: the dense buffer primitive (dtype + shape + storage)
//! - [`runtime`]: memory descriptors, allocators, data transfer
//! - [`sparse`]: representations, builders and the sparse container
//!
//! ## Quick Start
//!
//! ```rust
//! use sparse_rep::prelude::*;
//!
//! let sp = SparseTensor::csr_from_vecs(
//!     [4, 4],
//!     vec![1.0f32, 2.0, 3.0],
//!     vec![2, 0, 1],          // column of each value
//!     vec![0, 1, 2, 3, 3],    // row start offsets
//! )?;
//! let csr = sp.get_rep::<SparseCsrcFormatRep>();
//! assert_eq!(csr.order(), CsrcOrder::RowMajor);
//! # Ok::<(), sparse_rep::error::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `f16`: Half-precision values (`half::f16`, `half::bf16`)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod dtype;
pub mod error;
pub mod runtime;
pub mod sparse;
pub mod tensor;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::dtype::{DType, Element};
    pub use crate::error::{Error, Result};
    pub use crate::runtime::{
        Allocator, AllocatorPtr, CpuAllocator, CpuDataTransfer, DataTransfer,
        DataTransferManager, ExecQueue, MemoryInfo, MemoryKind,
    };
    pub use crate::sparse::{
        CsrcOrder, FormatRep, IndexValidation, SparseCooFormatRep, SparseCsrcFormatRep,
        SparseFormat, SparseRep, SparseTensor,
    };
    pub use crate::tensor::{Shape, Tensor};
}
