//! Building sparse tensors from host arrays
//!
//! `*_from_vecs` take ownership of the arrays and alias them (no copy); the
//! vectors are kept alive inside the tensor. `*_from_slices` copy into
//! allocator-owned buffers. Both run strict index validation.

use crate::dtype::Element;
use crate::error::{Error, Result};
use crate::runtime::{AllocatorPtr, MemoryInfo};
use crate::tensor::Shape;

use super::super::coo::SparseCooFormatRep;
use super::super::csrc::{CsrcOrder, SparseCsrcFormatRep};
use super::core::SparseTensor;

impl SparseTensor {
    /// CSR tensor over host vectors, without copying
    pub fn csr_from_vecs<T: Element>(
        dense_shape: impl Into<Shape>,
        mut values: Vec<T>,
        mut inner: Vec<i64>,
        mut outer: Vec<i64>,
    ) -> Result<Self> {
        let values_ptr = values.as_mut_ptr().cast::<u8>();
        let (inner_len, inner_ptr) = (inner.len(), inner.as_mut_ptr());
        let (outer_len, outer_ptr) = (outer.len(), outer.as_mut_ptr());

        // SAFETY: each pointer addresses its vector's live elements; the
        // vectors move into keep_alive, which outlives every aliasing tensor.
        // Moving a Vec does not move its heap buffer.
        let mut tensor = unsafe {
            SparseTensor::from_raw_values(
                T::DTYPE,
                dense_shape,
                values.len(),
                values_ptr,
                MemoryInfo::cpu(),
            )?
        };
        tensor.keep_alive(Box::new(values));
        tensor.keep_alive(Box::new(inner));
        tensor.keep_alive(Box::new(outer));

        // SAFETY: see above.
        unsafe {
            tensor.csrc_builder().get_or_create_from_raw(
                CsrcOrder::RowMajor,
                [inner_len],
                [outer_len],
                inner_ptr,
                outer_ptr,
            )?;
        }
        Ok(tensor)
    }

    /// COO tensor over host vectors, without copying
    ///
    /// `indices_shape` is `[nnz]` for linear indices or `[nnz, rank]` for
    /// coordinates and must describe exactly `indices.len()` elements.
    pub fn coo_from_vecs<T: Element>(
        dense_shape: impl Into<Shape>,
        mut values: Vec<T>,
        mut indices: Vec<i64>,
        indices_shape: impl Into<Shape>,
    ) -> Result<Self> {
        let indices_shape = indices_shape.into();
        check_indices_array(&indices_shape, indices.len())?;

        let values_ptr = values.as_mut_ptr().cast::<u8>();
        let indices_ptr = indices.as_mut_ptr();

        // SAFETY: as in csr_from_vecs.
        let mut tensor = unsafe {
            SparseTensor::from_raw_values(
                T::DTYPE,
                dense_shape,
                values.len(),
                values_ptr,
                MemoryInfo::cpu(),
            )?
        };
        tensor.keep_alive(Box::new(values));
        tensor.keep_alive(Box::new(indices));

        // SAFETY: as in csr_from_vecs.
        unsafe {
            tensor
                .coo_builder()
                .get_or_create_from_raw(indices_shape, indices_ptr)?;
        }
        Ok(tensor)
    }

    /// CSR tensor copied from host slices into `allocator`-owned buffers
    pub fn csr_from_slices<T: Element>(
        dense_shape: impl Into<Shape>,
        values: &[T],
        inner: &[i64],
        outer: &[i64],
        allocator: AllocatorPtr,
    ) -> Result<Self> {
        let mut tensor = SparseTensor::new(T::DTYPE, dense_shape, values.len(), allocator)?;
        tensor
            .mutable_values()
            .as_mut_slice::<T>()?
            .copy_from_slice(values);

        let rep = tensor.csrc_builder().get_or_create(
            CsrcOrder::RowMajor,
            [inner.len()],
            [outer.len()],
        )?;
        rep.mutable_inner()
            .as_mut_slice::<i64>()?
            .copy_from_slice(inner);
        rep.mutable_outer()
            .as_mut_slice::<i64>()?
            .copy_from_slice(outer);

        tensor.get_rep::<SparseCsrcFormatRep>().check_contents(tensor.dense_shape(), tensor.nnz())?;
        Ok(tensor)
    }

    /// COO tensor copied from host slices into `allocator`-owned buffers
    pub fn coo_from_slices<T: Element>(
        dense_shape: impl Into<Shape>,
        values: &[T],
        indices: &[i64],
        indices_shape: impl Into<Shape>,
        allocator: AllocatorPtr,
    ) -> Result<Self> {
        let indices_shape = indices_shape.into();
        check_indices_array(&indices_shape, indices.len())?;

        let mut tensor = SparseTensor::new(T::DTYPE, dense_shape, values.len(), allocator)?;
        tensor
            .mutable_values()
            .as_mut_slice::<T>()?
            .copy_from_slice(values);

        let rep = tensor
            .coo_builder()
            .get_or_create(indices_shape.ndim() == 1)?;
        if rep.indices().shape() != &indices_shape {
            return Err(Error::shape_mismatch(rep.indices().shape(), &indices_shape));
        }
        rep.mutable_indices()
            .as_mut_slice::<i64>()?
            .copy_from_slice(indices);

        tensor.get_rep::<SparseCooFormatRep>().check_contents(tensor.dense_shape())?;
        Ok(tensor)
    }
}

fn check_indices_array(indices_shape: &Shape, len: usize) -> Result<()> {
    if !matches!(indices_shape.ndim(), 1 | 2) {
        return Err(Error::invalid_argument(
            "indices_shape",
            format!("expected 1-D or 2-D indices, got {}-D", indices_shape.ndim()),
        ));
    }
    if indices_shape.numel() != len {
        return Err(Error::shape_mismatch(indices_shape, &[len]));
    }
    Ok(())
}
