//! Core CSR/CSC representation: struct, creation, getters, validation

use crate::dtype::DType;
use crate::error::{Error, Result};
use crate::runtime::{AllocatorPtr, ExecQueue, MemoryInfo, TensorCopier};
use crate::tensor::{Shape, Tensor};

use super::super::format::SparseFormat;
use super::super::rep::{FormatRep, SparseRep, copy_tensor_to};

const FORMAT_NAME: &str = "CSR(C)";

/// Matrix order a compressed representation encodes
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CsrcOrder {
    /// CSR: outer indices walk rows, inner indices are column positions
    RowMajor = 1,
    /// CSC: outer indices walk columns, inner indices are row positions
    ColMajor = 2,
}

impl CsrcOrder {
    /// Returns (outer dimension, inner dimension) of a 2-D dense shape
    #[inline]
    pub fn outer_inner(self, dense: [usize; 2]) -> (usize, usize) {
        match self {
            CsrcOrder::RowMajor => (dense[0], dense[1]),
            CsrcOrder::ColMajor => (dense[1], dense[0]),
        }
    }

    /// Conventional name of the format in this order
    pub fn name(self) -> &'static str {
        match self {
            CsrcOrder::RowMajor => "CSR",
            CsrcOrder::ColMajor => "CSC",
        }
    }
}

/// Compressed Storage Row (Column) representation
///
/// `inner` holds the position of each stored value within its row (column);
/// `outer` holds, per row (column), the offset where its entries start in
/// `inner` and in the tensor's values, plus a trailing `nnz`. Both are I64.
#[derive(Debug)]
pub struct SparseCsrcFormatRep {
    order: CsrcOrder,
    inner: Tensor,
    outer: Tensor,
}

impl SparseCsrcFormatRep {
    /// Allocate zeroed index buffers of the given shapes
    ///
    /// Shapes are normally 1-D; zero-length shapes allocate nothing.
    pub fn new(
        order: CsrcOrder,
        inner_shape: impl Into<Shape>,
        outer_shape: impl Into<Shape>,
        allocator: &AllocatorPtr,
    ) -> Result<Self> {
        Ok(Self {
            order,
            inner: Tensor::new(DType::I64, inner_shape, allocator)?,
            outer: Tensor::new(DType::I64, outer_shape, allocator)?,
        })
    }

    /// Wrap caller-owned index memory without copying
    ///
    /// # Safety
    /// - `inner_data` and `outer_data` must point to `inner_shape.numel()` and
    ///   `outer_shape.numel()` valid, aligned `i64`s in the memory described
    ///   by `info` (either may be null if its shape has zero elements)
    /// - The memory must outlive the representation and the tensor that holds it
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if a shape's byte size overflows.
    pub unsafe fn from_raw(
        order: CsrcOrder,
        inner_shape: impl Into<Shape>,
        outer_shape: impl Into<Shape>,
        inner_data: *mut i64,
        outer_data: *mut i64,
        info: MemoryInfo,
    ) -> Result<Self> {
        // SAFETY: forwarded from the caller's contract.
        unsafe {
            Ok(Self {
                order,
                inner: Tensor::from_raw(DType::I64, inner_shape, inner_data.cast(), info.clone())?,
                outer: Tensor::from_raw(DType::I64, outer_shape, outer_data.cast(), info)?,
            })
        }
    }

    /// Returns the matrix order currently represented
    #[inline]
    pub fn order(&self) -> CsrcOrder {
        self.order
    }

    /// Per-value positions within each row (column)
    #[inline]
    pub fn inner(&self) -> &Tensor {
        &self.inner
    }

    /// Row (column) start offsets
    #[inline]
    pub fn outer(&self) -> &Tensor {
        &self.outer
    }

    /// Mutable inner indices
    #[inline]
    pub fn mutable_inner(&mut self) -> &mut Tensor {
        &mut self.inner
    }

    /// Mutable outer indices
    #[inline]
    pub fn mutable_outer(&mut self) -> &mut Tensor {
        &mut self.outer
    }

    /// Check index buffers against a dense shape and non-zero count
    ///
    /// Shapes are always checked. Contents are checked when the buffers are
    /// host accessible: `outer` must start at 0, never decrease and end at
    /// `nnz`; every inner index must lie in `[0, inner dimension)`.
    pub fn validate(&self, dense_shape: &Shape, nnz: usize) -> Result<()> {
        check_shapes(
            self.order,
            self.inner.shape(),
            self.outer.shape(),
            dense_shape,
            nnz,
        )?;
        self.check_contents(dense_shape, nnz)
    }

    pub(crate) fn check_contents(&self, dense_shape: &Shape, nnz: usize) -> Result<()> {
        if !self.inner.location().is_host_accessible() {
            tracing::debug!(
                memory = %self.inner.location(),
                "skipping CSR(C) index content checks on non-host memory"
            );
            return Ok(());
        }

        let (_, inner_dim) = self.order.outer_inner(dense_2d(dense_shape)?);
        let outer = self.outer.as_slice::<i64>()?;
        let inner = self.inner.as_slice::<i64>()?;

        if let (Some(&first), Some(&last)) = (outer.first(), outer.last()) {
            if first != 0 {
                return Err(Error::invalid_indices(
                    FORMAT_NAME,
                    format!("outer indices must start at 0, got {first}"),
                ));
            }
            if let Some(pos) = outer.windows(2).position(|w| w[1] < w[0]) {
                return Err(Error::invalid_indices(
                    FORMAT_NAME,
                    format!(
                        "outer indices decrease at position {}: {} -> {}",
                        pos + 1,
                        outer[pos],
                        outer[pos + 1]
                    ),
                ));
            }
            if last != nnz as i64 {
                return Err(Error::invalid_indices(
                    FORMAT_NAME,
                    format!("last outer index must equal nnz {nnz}, got {last}"),
                ));
            }
        }

        if let Some(&bad) = inner.iter().find(|&&i| i < 0 || i as usize >= inner_dim) {
            return Err(Error::IndexOutOfBounds {
                index: bad,
                size: inner_dim,
            });
        }
        Ok(())
    }
}

fn dense_2d(dense_shape: &Shape) -> Result<[usize; 2]> {
    match dense_shape.as_slice() {
        &[rows, cols] => Ok([rows, cols]),
        dims => Err(Error::invalid_indices(
            FORMAT_NAME,
            format!("requires a 2-D dense shape, got {}-D", dims.len()),
        )),
    }
}

/// Shape checks shared by validation and the builder's create path
pub(crate) fn check_shapes(
    order: CsrcOrder,
    inner_shape: &Shape,
    outer_shape: &Shape,
    dense_shape: &Shape,
    nnz: usize,
) -> Result<()> {
    let dense = dense_2d(dense_shape)?;
    let dense_numel = dense_shape.checked_numel().ok_or_else(|| {
        Error::invalid_indices(FORMAT_NAME, format!("dense shape {dense_shape} overflows usize"))
    })?;
    if nnz > dense_numel {
        return Err(Error::invalid_indices(
            FORMAT_NAME,
            format!("nnz {nnz} exceeds dense size {dense_numel}"),
        ));
    }
    if inner_shape.checked_numel() != Some(nnz) {
        return Err(Error::shape_mismatch(&[nnz], inner_shape));
    }

    let (outer_dim, _) = order.outer_inner(dense);
    let expected_outer = outer_dim.checked_add(1).ok_or_else(|| {
        Error::invalid_indices(FORMAT_NAME, format!("outer dimension {outer_dim} is too large"))
    })?;
    let outer_len = outer_shape.checked_numel();
    // A tensor with no values may omit the outer indices entirely
    if outer_len != Some(expected_outer) && !(nnz == 0 && outer_len == Some(0)) {
        return Err(Error::shape_mismatch(&[expected_outer], outer_shape));
    }
    Ok(())
}

impl FormatRep for SparseCsrcFormatRep {
    const FORMAT: SparseFormat = SparseFormat::Csrc;

    fn from_rep(rep: &SparseRep) -> Option<&Self> {
        match rep {
            SparseRep::Csrc(r) => Some(r),
            _ => None,
        }
    }

    fn from_rep_mut(rep: &mut SparseRep) -> Option<&mut Self> {
        match rep {
            SparseRep::Csrc(r) => Some(r),
            _ => None,
        }
    }

    fn into_rep(self) -> SparseRep {
        SparseRep::Csrc(self)
    }

    fn copy_via<C: TensorCopier + ?Sized>(
        &self,
        copier: &C,
        allocator: &AllocatorPtr,
        queue: ExecQueue,
    ) -> Result<Self> {
        Ok(Self {
            order: self.order,
            inner: copy_tensor_to(&self.inner, copier, allocator, queue)?,
            outer: copy_tensor_to(&self.outer, copier, allocator, queue)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{CpuAllocator, CpuDataTransfer, DataTransferManager};

    fn filled(order: CsrcOrder, inner: &[i64], outer: &[i64]) -> SparseCsrcFormatRep {
        let alloc = CpuAllocator::shared();
        let mut rep = SparseCsrcFormatRep::new(order, [inner.len()], [outer.len()], &alloc).unwrap();
        rep.mutable_inner()
            .as_mut_slice::<i64>()
            .unwrap()
            .copy_from_slice(inner);
        rep.mutable_outer()
            .as_mut_slice::<i64>()
            .unwrap()
            .copy_from_slice(outer);
        rep
    }

    #[test]
    fn test_owned_sizes() {
        let alloc = CpuAllocator::shared();
        let rep = SparseCsrcFormatRep::new(CsrcOrder::RowMajor, [3], [5], &alloc).unwrap();
        assert_eq!(rep.inner().numel(), 3);
        assert_eq!(rep.outer().numel(), 5);
        assert_eq!(rep.inner().dtype(), DType::I64);
        assert!(rep.inner().owns_buffer());
    }

    #[test]
    fn test_validate_ok() {
        // [0 0 1 0]
        // [1 0 0 0]
        // [0 1 0 0]
        // [0 0 0 0]
        let rep = filled(CsrcOrder::RowMajor, &[2, 0, 1], &[0, 1, 2, 3, 3]);
        rep.validate(&Shape::from([4, 4]), 3).unwrap();
    }

    #[test]
    fn test_validate_col_major_dims() {
        // 2x3 CSC: outer has ncols + 1 = 4 entries, inner indexes rows (< 2)
        let rep = filled(CsrcOrder::ColMajor, &[1, 0], &[0, 1, 1, 2]);
        rep.validate(&Shape::from([2, 3]), 2).unwrap();

        let bad = filled(CsrcOrder::ColMajor, &[2, 0], &[0, 1, 1, 2]);
        assert!(matches!(
            bad.validate(&Shape::from([2, 3]), 2),
            Err(Error::IndexOutOfBounds { index: 2, size: 2 })
        ));
    }

    #[test]
    fn test_validate_rejects_bad_outer() {
        let dense = Shape::from([2, 2]);
        let not_zero_start = filled(CsrcOrder::RowMajor, &[0], &[1, 1, 1]);
        assert!(matches!(
            not_zero_start.validate(&dense, 1),
            Err(Error::InvalidIndices { .. })
        ));

        let decreasing = filled(CsrcOrder::RowMajor, &[0, 1], &[0, 2, 1]);
        assert!(decreasing.validate(&dense, 2).is_err());

        let wrong_len = filled(CsrcOrder::RowMajor, &[0], &[0, 1]);
        assert!(matches!(
            wrong_len.validate(&dense, 1),
            Err(Error::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_validate_requires_2d() {
        let rep = filled(CsrcOrder::RowMajor, &[], &[]);
        assert!(rep.validate(&Shape::from([4]), 0).is_err());
        rep.validate(&Shape::from([4, 4]), 0).unwrap();
    }

    #[test]
    fn test_shape_checks_do_not_overflow() {
        let inner = Shape::from([1]);
        let outer = Shape::from([2]);
        let overflowing = Shape::from([usize::MAX, 2]);
        assert!(matches!(
            check_shapes(CsrcOrder::RowMajor, &inner, &outer, &overflowing, 1),
            Err(Error::InvalidIndices { .. })
        ));

        // Fits in usize, but the outer length rows + 1 does not
        let tall = Shape::from([usize::MAX, 1]);
        assert!(matches!(
            check_shapes(CsrcOrder::RowMajor, &inner, &outer, &tall, 1),
            Err(Error::InvalidIndices { .. })
        ));
    }

    #[test]
    fn test_copy_preserves_order_and_contents() {
        let src = filled(CsrcOrder::ColMajor, &[1, 0], &[0, 1, 1, 2]);
        let dst_alloc = CpuAllocator::shared();

        let a = src
            .copy(&DataTransferManager::with_defaults(), &dst_alloc, ExecQueue::DEFAULT)
            .unwrap();
        let b = src
            .copy_with(&CpuDataTransfer, &dst_alloc, ExecQueue(3))
            .unwrap();

        for copy in [&a, &b] {
            assert_eq!(copy.order(), CsrcOrder::ColMajor);
            assert_eq!(copy.inner().to_vec::<i64>().unwrap(), vec![1, 0]);
            assert_eq!(copy.outer().to_vec::<i64>().unwrap(), vec![0, 1, 1, 2]);
            assert_ne!(copy.inner().data_ptr(), src.inner().data_ptr());
        }
    }
}
