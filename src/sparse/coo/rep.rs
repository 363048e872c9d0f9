//! Core COO representation: struct, creation, getters, validation

use crate::dtype::DType;
use crate::error::{Error, Result};
use crate::runtime::{AllocatorPtr, ExecQueue, MemoryInfo, TensorCopier};
use crate::tensor::{Shape, Tensor};

use super::super::format::SparseFormat;
use super::super::rep::{FormatRep, SparseRep, copy_tensor_to};

const FORMAT_NAME: &str = "COO";

/// Coordinate representation
///
/// `indices` is either `[nnz]` (linear offsets into the row-major dense
/// shape) or `[nnz, rank]` (one coordinate tuple per value). I64 elements.
#[derive(Debug)]
pub struct SparseCooFormatRep {
    indices: Tensor,
}

impl SparseCooFormatRep {
    /// Allocate zeroed indices of the given shape
    pub fn new(indices_shape: impl Into<Shape>, allocator: &AllocatorPtr) -> Result<Self> {
        Ok(Self {
            indices: Tensor::new(DType::I64, indices_shape, allocator)?,
        })
    }

    /// Wrap caller-owned indices without copying
    ///
    /// # Safety
    /// - `indices_data` must point to `indices_shape.numel()` valid, aligned
    ///   `i64`s in the memory described by `info` (null if that is zero)
    /// - The memory must outlive the representation and the tensor that holds it
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the shape's byte size overflows.
    pub unsafe fn from_raw(
        indices_shape: impl Into<Shape>,
        indices_data: *mut i64,
        info: MemoryInfo,
    ) -> Result<Self> {
        // SAFETY: forwarded from the caller's contract.
        let indices =
            unsafe { Tensor::from_raw(DType::I64, indices_shape, indices_data.cast(), info)? };
        Ok(Self { indices })
    }

    /// Index buffer
    #[inline]
    pub fn indices(&self) -> &Tensor {
        &self.indices
    }

    /// Mutable index buffer
    #[inline]
    pub fn mutable_indices(&mut self) -> &mut Tensor {
        &mut self.indices
    }

    /// True if indices are linear offsets rather than coordinate tuples
    #[inline]
    pub fn is_linear(&self) -> bool {
        self.indices.ndim() == 1
    }

    /// Check indices against a dense shape and non-zero count
    ///
    /// Contents are checked when host accessible: linear indices must lie in
    /// `[0, dense numel)`, coordinate `j` of each tuple in `[0, dense[j])`.
    pub fn validate(&self, dense_shape: &Shape, nnz: usize) -> Result<()> {
        check_shape(self.indices.shape(), dense_shape, nnz)?;
        self.check_contents(dense_shape)
    }

    pub(crate) fn check_contents(&self, dense_shape: &Shape) -> Result<()> {
        if !self.indices.location().is_host_accessible() {
            tracing::debug!(
                memory = %self.indices.location(),
                "skipping COO index content checks on non-host memory"
            );
            return Ok(());
        }

        let indices = self.indices.as_slice::<i64>()?;
        let out_of_bounds = |index: i64, size: usize| index < 0 || index as usize >= size;

        if self.is_linear() {
            let size = dense_shape.numel();
            if let Some(&bad) = indices.iter().find(|&&i| out_of_bounds(i, size)) {
                return Err(Error::IndexOutOfBounds { index: bad, size });
            }
            return Ok(());
        }

        let rank = dense_shape.ndim();
        if rank == 0 {
            return Ok(());
        }
        for tuple in indices.chunks_exact(rank) {
            for (&index, &size) in tuple.iter().zip(dense_shape.iter()) {
                if out_of_bounds(index, size) {
                    return Err(Error::IndexOutOfBounds { index, size });
                }
            }
        }
        Ok(())
    }
}

/// Shape checks shared by validation and the builder's create path
pub(crate) fn check_shape(indices_shape: &Shape, dense_shape: &Shape, nnz: usize) -> Result<()> {
    let dense_numel = dense_shape.checked_numel().ok_or_else(|| {
        Error::invalid_indices(FORMAT_NAME, format!("dense shape {dense_shape} overflows usize"))
    })?;
    if nnz > dense_numel {
        return Err(Error::invalid_indices(
            FORMAT_NAME,
            format!("nnz {nnz} exceeds dense size {dense_numel}"),
        ));
    }
    match indices_shape.as_slice() {
        &[n] if n == nnz => Ok(()),
        &[n, rank] if n == nnz && rank == dense_shape.ndim() => Ok(()),
        &[_] => Err(Error::shape_mismatch(&[nnz], indices_shape)),
        &[_, _] => Err(Error::shape_mismatch(
            &[nnz, dense_shape.ndim()],
            indices_shape,
        )),
        dims => Err(Error::invalid_indices(
            FORMAT_NAME,
            format!("indices must be 1-D or 2-D, got {}-D", dims.len()),
        )),
    }
}

impl FormatRep for SparseCooFormatRep {
    const FORMAT: SparseFormat = SparseFormat::Coo;

    fn from_rep(rep: &SparseRep) -> Option<&Self> {
        match rep {
            SparseRep::Coo(r) => Some(r),
            _ => None,
        }
    }

    fn from_rep_mut(rep: &mut SparseRep) -> Option<&mut Self> {
        match rep {
            SparseRep::Coo(r) => Some(r),
            _ => None,
        }
    }

    fn into_rep(self) -> SparseRep {
        SparseRep::Coo(self)
    }

    fn copy_via<C: TensorCopier + ?Sized>(
        &self,
        copier: &C,
        allocator: &AllocatorPtr,
        queue: ExecQueue,
    ) -> Result<Self> {
        Ok(Self {
            indices: copy_tensor_to(&self.indices, copier, allocator, queue)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{CpuAllocator, DataTransferManager};

    fn filled(shape: impl Into<Shape>, data: &[i64]) -> SparseCooFormatRep {
        let mut rep = SparseCooFormatRep::new(shape, &CpuAllocator::shared()).unwrap();
        rep.mutable_indices()
            .as_mut_slice::<i64>()
            .unwrap()
            .copy_from_slice(data);
        rep
    }

    #[test]
    fn test_linear_indices() {
        let rep = filled([3], &[2, 4, 8]);
        assert!(rep.is_linear());
        rep.validate(&Shape::from([3, 3]), 3).unwrap();
        assert!(matches!(
            rep.validate(&Shape::from([2, 4]), 3),
            Err(Error::IndexOutOfBounds { index: 8, size: 8 })
        ));
    }

    #[test]
    fn test_coordinate_indices() {
        // (0, 2), (1, 0)
        let rep = filled([2, 2], &[0, 2, 1, 0]);
        assert!(!rep.is_linear());
        rep.validate(&Shape::from([2, 3]), 2).unwrap();
        assert!(rep.validate(&Shape::from([2, 2]), 2).is_err());
    }

    #[test]
    fn test_shape_checks() {
        let dense = Shape::from([4, 4]);
        check_shape(&Shape::from([3]), &dense, 3).unwrap();
        check_shape(&Shape::from([3, 2]), &dense, 3).unwrap();
        assert!(check_shape(&Shape::from([2]), &dense, 3).is_err());
        assert!(check_shape(&Shape::from([3, 3]), &dense, 3).is_err());
        assert!(check_shape(&Shape::from([3, 2, 1]), &dense, 3).is_err());
        assert!(check_shape(&Shape::from([17]), &dense, 17).is_err());
    }

    #[test]
    fn test_shape_checks_overflowing_dense() {
        let huge = Shape::from([usize::MAX, 2]);
        assert!(matches!(
            check_shape(&Shape::from([3]), &huge, 3),
            Err(Error::InvalidIndices { .. })
        ));
    }

    #[test]
    fn test_copy() {
        let src = filled([3], &[1, 5, 7]);
        let copy = src
            .copy(
                &DataTransferManager::with_defaults(),
                &CpuAllocator::shared(),
                ExecQueue::DEFAULT,
            )
            .unwrap();
        assert_eq!(copy.indices().to_vec::<i64>().unwrap(), vec![1, 5, 7]);
        assert_eq!(copy.indices().shape(), src.indices().shape());
    }
}
