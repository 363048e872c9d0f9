//! Sparse tensors with interchangeable representations
//!
//! A [`SparseTensor`] owns a dense shape, `nnz` values and at most one bound
//! representation ([`SparseRep`]). Two encodings are available:
//!
//! - **COO** ([`SparseCooFormatRep`]): one linear index or coordinate tuple
//!   per value.
//! - **CSR/CSC** ([`SparseCsrcFormatRep`]): per-row (column) start offsets
//!   plus one inner index per value.
//!
//! # Binding protocol
//!
//! A representation is bound through a builder obtained from the tensor
//! (`csrc_builder`, `coo_builder`, or generically `rep_builder::<B>()`).
//! `get_or_create` binds on the first call and returns the same object on
//! every later call. Index buffers are either allocated from the tensor's
//! allocator or alias caller memory (`get_or_create_from_raw`).
//!
//! ```
//! # use sparse_rep::prelude::*;
//! let mut sp = SparseTensor::new(DType::F64, [4, 4], 3, CpuAllocator::shared())?;
//! sp.mutable_values().as_mut_slice::<f64>()?.copy_from_slice(&[1.0, 2.0, 3.0]);
//!
//! let rep = sp.csrc_builder().get_or_create(CsrcOrder::RowMajor, [3], [5])?;
//! rep.mutable_inner().as_mut_slice::<i64>()?.copy_from_slice(&[2, 0, 1]);
//! rep.mutable_outer().as_mut_slice::<i64>()?.copy_from_slice(&[0, 1, 2, 3, 3]);
//! sp.validate()?;
//!
//! // Deep copy to another allocator
//! let copy = sp.copy_to(
//!     &DataTransferManager::with_defaults(),
//!     &CpuAllocator::shared(),
//!     ExecQueue::DEFAULT,
//! )?;
//! assert_eq!(copy.get_rep::<SparseCsrcFormatRep>().order(), CsrcOrder::RowMajor);
//! # Ok::<(), sparse_rep::error::Error>(())
//! ```

mod coo;
mod csrc;
mod format;
mod rep;
mod tensor;

pub use coo::{SparseCooBuilder, SparseCooFormatRep};
pub use csrc::{CsrcOrder, SparseCsrcBuilder, SparseCsrcFormatRep};
pub use format::{IndexValidation, SparseFormat};
pub use rep::{FormatRep, RepBuilder, SparseRep};
pub use tensor::SparseTensor;
