//! Representation base: the closed set of sparse encodings
//!
//! A `SparseTensor` holds at most one `SparseRep`. Because `SparseRep` is an
//! enum, the format a tensor reports is always the variant it stores.

use super::coo::SparseCooFormatRep;
use super::csrc::SparseCsrcFormatRep;
use super::format::SparseFormat;
use super::tensor::SparseTensor;
use crate::error::Result;
use crate::runtime::{AllocatorPtr, DataTransfer, DataTransferManager, ExecQueue, TensorCopier};
use crate::tensor::{Shape, Tensor};

/// A bound sparse encoding
#[derive(Debug)]
pub enum SparseRep {
    /// Coordinate encoding
    Coo(SparseCooFormatRep),
    /// Compressed row/column encoding
    Csrc(SparseCsrcFormatRep),
}

impl SparseRep {
    /// Format of this encoding
    pub fn format(&self) -> SparseFormat {
        match self {
            SparseRep::Coo(_) => SparseFormat::Coo,
            SparseRep::Csrc(_) => SparseFormat::Csrc,
        }
    }

    /// Copy indices onto `allocator`, choosing the transfer per buffer
    ///
    /// The result is the same variant as `self`; `self` is not modified.
    pub fn copy(
        &self,
        manager: &DataTransferManager,
        allocator: &AllocatorPtr,
        queue: ExecQueue,
    ) -> Result<SparseRep> {
        self.copy_via(manager, allocator, queue)
    }

    /// Copy indices onto `allocator` with a specific transfer
    pub fn copy_with(
        &self,
        transfer: &dyn DataTransfer,
        allocator: &AllocatorPtr,
        queue: ExecQueue,
    ) -> Result<SparseRep> {
        self.copy_via(transfer, allocator, queue)
    }

    pub(crate) fn copy_via<C: TensorCopier + ?Sized>(
        &self,
        copier: &C,
        allocator: &AllocatorPtr,
        queue: ExecQueue,
    ) -> Result<SparseRep> {
        Ok(match self {
            SparseRep::Coo(rep) => SparseRep::Coo(rep.copy_via(copier, allocator, queue)?),
            SparseRep::Csrc(rep) => SparseRep::Csrc(rep.copy_via(copier, allocator, queue)?),
        })
    }

    /// Check the index buffers against a dense shape and non-zero count
    pub fn validate(&self, dense_shape: &Shape, nnz: usize) -> Result<()> {
        match self {
            SparseRep::Coo(rep) => rep.validate(dense_shape, nnz),
            SparseRep::Csrc(rep) => rep.validate(dense_shape, nnz),
        }
    }
}

mod private {
    pub trait Sealed {}
    impl Sealed for super::SparseCooFormatRep {}
    impl Sealed for super::SparseCsrcFormatRep {}
}

/// A concrete variant of `SparseRep`
///
/// Used as the type parameter of `SparseTensor::get_rep` and by builders to
/// bind and fetch their variant.
pub trait FormatRep: Sized + private::Sealed {
    /// Format this variant encodes
    const FORMAT: SparseFormat;

    /// Match this variant
    fn from_rep(rep: &SparseRep) -> Option<&Self>;

    /// Match this variant mutably
    fn from_rep_mut(rep: &mut SparseRep) -> Option<&mut Self>;

    /// Wrap into the sum type
    fn into_rep(self) -> SparseRep;

    #[doc(hidden)]
    fn copy_via<C: TensorCopier + ?Sized>(
        &self,
        copier: &C,
        allocator: &AllocatorPtr,
        queue: ExecQueue,
    ) -> Result<Self>;

    /// Copy onto `allocator`, choosing the transfer per buffer
    fn copy(
        &self,
        manager: &DataTransferManager,
        allocator: &AllocatorPtr,
        queue: ExecQueue,
    ) -> Result<Self> {
        self.copy_via(manager, allocator, queue)
    }

    /// Copy onto `allocator` with a specific transfer
    fn copy_with(
        &self,
        transfer: &dyn DataTransfer,
        allocator: &AllocatorPtr,
        queue: ExecQueue,
    ) -> Result<Self> {
        self.copy_via(transfer, allocator, queue)
    }
}

/// A builder that binds or fetches one `FormatRep` on a tensor
///
/// The builder mutably borrows the tensor, so it cannot outlive it.
pub trait RepBuilder<'a>: Sized {
    /// Variant this builder produces
    type Rep: FormatRep;

    /// Create the builder for `tensor`
    ///
    /// Called by `SparseTensor::rep_builder` after the format check.
    fn bind(tensor: &'a mut SparseTensor) -> Self;
}

/// Allocate a tensor like `src` on `allocator` and copy `src` into it
pub(crate) fn copy_tensor_to<C: TensorCopier + ?Sized>(
    src: &Tensor,
    copier: &C,
    allocator: &AllocatorPtr,
    queue: ExecQueue,
) -> Result<Tensor> {
    let mut dst = Tensor::new(src.dtype(), src.shape().clone(), allocator)?;
    copier.transfer(src, &mut dst, queue)?;
    Ok(dst)
}
