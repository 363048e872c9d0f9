//! Get-or-create builder for the CSR/CSC representation

use crate::error::{Error, Result};
use crate::tensor::Shape;

use super::super::rep::RepBuilder;
use super::super::tensor::SparseTensor;
use super::rep::{CsrcOrder, SparseCsrcFormatRep, check_shapes};

/// Binds a `SparseCsrcFormatRep` to a tensor, or fetches the bound one
///
/// Obtained from `SparseTensor::csrc_builder` or
/// `SparseTensor::rep_builder::<SparseCsrcBuilder>()`.
///
/// # Example
///
/// ```
/// # use sparse_rep::prelude::*;
/// let mut sp = SparseTensor::new(DType::F32, [4, 4], 3, CpuAllocator::shared())?;
/// let rep = sp.csrc_builder().get_or_create(CsrcOrder::RowMajor, [3], [5])?;
/// rep.mutable_outer().as_mut_slice::<i64>()?.copy_from_slice(&[0, 1, 2, 3, 3]);
/// rep.mutable_inner().as_mut_slice::<i64>()?.copy_from_slice(&[2, 0, 1]);
/// assert_eq!(sp.get_rep::<SparseCsrcFormatRep>().order(), CsrcOrder::RowMajor);
/// # Ok::<(), sparse_rep::error::Error>(())
/// ```
pub struct SparseCsrcBuilder<'a> {
    tensor: &'a mut SparseTensor,
}

impl<'a> RepBuilder<'a> for SparseCsrcBuilder<'a> {
    type Rep = SparseCsrcFormatRep;

    fn bind(tensor: &'a mut SparseTensor) -> Self {
        Self { tensor }
    }
}

impl<'a> SparseCsrcBuilder<'a> {
    /// Bind freshly allocated index buffers, or return the bound representation
    ///
    /// Buffers come from the tensor's allocator and are zeroed; fill them
    /// through `mutable_inner` / `mutable_outer`. When a representation is
    /// already bound the shapes are ignored and the existing one is returned,
    /// provided `order` matches it.
    ///
    /// # Errors
    ///
    /// - the tensor wraps external values and has no allocator
    /// - strict validation rejects the shapes
    /// - a shape's byte size overflows, or allocation fails
    ///
    /// # Panics
    ///
    /// Panics if the bound representation has a different `order`.
    pub fn get_or_create(
        self,
        order: CsrcOrder,
        inner_shape: impl Into<Shape>,
        outer_shape: impl Into<Shape>,
    ) -> Result<&'a mut SparseCsrcFormatRep> {
        if self.tensor.is_bound() {
            return Ok(self.fetch(order));
        }

        let inner_shape = inner_shape.into();
        let outer_shape = outer_shape.into();
        self.check(order, &inner_shape, &outer_shape)?;

        let allocator = self.tensor.allocator().cloned().ok_or_else(|| {
            Error::invalid_argument(
                "allocator",
                "tensor wraps external values and has no allocator; bind external indices instead",
            )
        })?;
        let rep = SparseCsrcFormatRep::new(order, inner_shape, outer_shape, &allocator)?;
        let tensor = self.tensor;
        Ok(tensor.bind_rep(rep))
    }

    /// Bind caller-owned index buffers, or return the bound representation
    ///
    /// The buffers are wrapped without copying and are tagged with the
    /// memory descriptor of the tensor's values. Under strict validation,
    /// host-resident contents are checked before binding. When a
    /// representation is already bound, the shapes and pointers are ignored
    /// and the existing one is returned, provided `order` matches it.
    ///
    /// # Safety
    ///
    /// When this call binds, the same contract as `SparseCsrcFormatRep::from_raw`
    /// applies, with the memory located where the tensor's values are. The
    /// buffers must outlive the tensor.
    ///
    /// # Panics
    ///
    /// Panics if the bound representation has a different `order`.
    pub unsafe fn get_or_create_from_raw(
        self,
        order: CsrcOrder,
        inner_shape: impl Into<Shape>,
        outer_shape: impl Into<Shape>,
        inner_data: *mut i64,
        outer_data: *mut i64,
    ) -> Result<&'a mut SparseCsrcFormatRep> {
        if self.tensor.is_bound() {
            return Ok(self.fetch(order));
        }

        let inner_shape = inner_shape.into();
        let outer_shape = outer_shape.into();
        self.check(order, &inner_shape, &outer_shape)?;

        let info = self.tensor.location().clone();
        // SAFETY: forwarded from the caller's contract.
        let rep = unsafe {
            SparseCsrcFormatRep::from_raw(
                order,
                inner_shape,
                outer_shape,
                inner_data,
                outer_data,
                info,
            )?
        };
        if self.tensor.index_validation().is_strict() {
            rep.check_contents(self.tensor.dense_shape(), self.tensor.nnz())?;
        }
        let tensor = self.tensor;
        Ok(tensor.bind_rep(rep))
    }

    fn check(&self, order: CsrcOrder, inner_shape: &Shape, outer_shape: &Shape) -> Result<()> {
        if !self.tensor.index_validation().is_strict() {
            return Ok(());
        }
        check_shapes(
            order,
            inner_shape,
            outer_shape,
            self.tensor.dense_shape(),
            self.tensor.nnz(),
        )
    }

    fn fetch(self, order: CsrcOrder) -> &'a mut SparseCsrcFormatRep {
        let tensor = self.tensor;
        let rep = tensor.get_rep_mut::<SparseCsrcFormatRep>();
        assert_eq!(
            rep.order(),
            order,
            "Expecting {} format, tensor is bound as {}",
            order.name(),
            rep.order().name()
        );
        tracing::trace!(order = rep.order().name(), "fetched bound CSR(C) representation");
        rep
    }
}
