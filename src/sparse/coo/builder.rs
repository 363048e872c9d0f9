//! Get-or-create builder for the COO representation

use crate::error::{Error, Result};
use crate::tensor::Shape;

use super::super::rep::RepBuilder;
use super::super::tensor::SparseTensor;
use super::rep::{SparseCooFormatRep, check_shape};

/// Binds a `SparseCooFormatRep` to a tensor, or fetches the bound one
pub struct SparseCooBuilder<'a> {
    tensor: &'a mut SparseTensor,
}

impl<'a> RepBuilder<'a> for SparseCooBuilder<'a> {
    type Rep = SparseCooFormatRep;

    fn bind(tensor: &'a mut SparseTensor) -> Self {
        Self { tensor }
    }
}

impl<'a> SparseCooBuilder<'a> {
    /// Bind freshly allocated indices, or return the bound representation
    ///
    /// `linear` selects `[nnz]` linear indices over `[nnz, rank]` coordinates.
    /// Ignored when a representation is already bound.
    pub fn get_or_create(self, linear: bool) -> Result<&'a mut SparseCooFormatRep> {
        if self.tensor.is_bound() {
            return Ok(self.fetch());
        }

        let nnz = self.tensor.nnz();
        let indices_shape = if linear {
            Shape::from([nnz])
        } else {
            Shape::from([nnz, self.tensor.dense_shape().ndim()])
        };
        self.check(&indices_shape)?;

        let allocator = self.tensor.allocator().cloned().ok_or_else(|| {
            Error::invalid_argument(
                "allocator",
                "tensor wraps external values and has no allocator; bind external indices instead",
            )
        })?;
        let rep = SparseCooFormatRep::new(indices_shape, &allocator)?;
        let tensor = self.tensor;
        Ok(tensor.bind_rep(rep))
    }

    /// Bind caller-owned indices, or return the bound representation
    ///
    /// When a representation is already bound, the shape and pointer are
    /// ignored.
    ///
    /// # Safety
    ///
    /// When this call binds, the same contract as `SparseCooFormatRep::from_raw`
    /// applies, with the memory located where the tensor's values are. The
    /// buffer must outlive the tensor.
    pub unsafe fn get_or_create_from_raw(
        self,
        indices_shape: impl Into<Shape>,
        indices_data: *mut i64,
    ) -> Result<&'a mut SparseCooFormatRep> {
        if self.tensor.is_bound() {
            return Ok(self.fetch());
        }

        let indices_shape = indices_shape.into();
        self.check(&indices_shape)?;

        let info = self.tensor.location().clone();
        // SAFETY: forwarded from the caller's contract.
        let rep = unsafe { SparseCooFormatRep::from_raw(indices_shape, indices_data, info)? };
        if self.tensor.index_validation().is_strict() {
            rep.check_contents(self.tensor.dense_shape())?;
        }
        let tensor = self.tensor;
        Ok(tensor.bind_rep(rep))
    }

    fn check(&self, indices_shape: &Shape) -> Result<()> {
        if !self.tensor.index_validation().is_strict() {
            return Ok(());
        }
        check_shape(indices_shape, self.tensor.dense_shape(), self.tensor.nnz())
    }

    fn fetch(self) -> &'a mut SparseCooFormatRep {
        tracing::trace!("fetched bound COO representation");
        let tensor = self.tensor;
        tensor.get_rep_mut::<SparseCooFormatRep>()
    }
}
