//! Core SparseTensor implementation: creation, accessors, representation slot

use std::any::Any;

use crate::dtype::DType;
use crate::error::{Error, Result};
use crate::runtime::{AllocatorPtr, MemoryInfo};
use crate::tensor::{Shape, Tensor};

use super::super::coo::SparseCooBuilder;
use super::super::csrc::SparseCsrcBuilder;
use super::super::format::{IndexValidation, SparseFormat};
use super::super::rep::{FormatRep, RepBuilder, SparseRep};

/// Sparse tensor bound to at most one representation
///
/// A `SparseTensor` owns its dense shape, the values buffer (length `nnz`)
/// and a single representation slot. The slot starts empty; the first
/// successful builder call binds a representation, and every later builder
/// call for the same format returns that same object.
///
/// # Contract violations
///
/// Asking for a representation that is not bound, or a builder for a
/// format other than the bound one, is a bug in the caller and panics.
/// Allocation, transfer and validation failures return `Error`.
///
/// # Example
///
/// ```
/// # use sparse_rep::prelude::*;
/// let mut sp = SparseTensor::csr_from_vecs(
///     [4, 4],
///     vec![1.0f32, 2.0, 3.0],
///     vec![2, 0, 1],
///     vec![0, 1, 2, 3, 3],
/// )?;
/// assert_eq!(sp.format(), Some(SparseFormat::Csrc));
/// let csr = sp.get_rep::<SparseCsrcFormatRep>();
/// assert_eq!(csr.inner().to_vec::<i64>()?, vec![2, 0, 1]);
/// # Ok::<(), sparse_rep::error::Error>(())
/// ```
pub struct SparseTensor {
    pub(super) dense_shape: Shape,
    pub(super) nnz: usize,
    pub(super) values: Tensor,
    pub(super) allocator: Option<AllocatorPtr>,
    pub(super) rep: Option<SparseRep>,
    pub(super) validation: IndexValidation,
    // Declared last: dropped after every tensor that may alias it
    pub(super) keep_alive: Vec<Box<dyn Any + Send + Sync>>,
}

impl SparseTensor {
    // =========================================================================
    // Constructors
    // =========================================================================

    /// Create a tensor whose values (and later indices) come from `allocator`
    ///
    /// Values are zeroed; fill them through `mutable_values`.
    pub fn new(
        dtype: DType,
        dense_shape: impl Into<Shape>,
        nnz: usize,
        allocator: AllocatorPtr,
    ) -> Result<Self> {
        let dense_shape = checked_dense_shape(dense_shape.into())?;
        let values = Tensor::new(dtype, [nnz], &allocator)?;
        Ok(Self {
            dense_shape,
            nnz,
            values,
            allocator: Some(allocator),
            rep: None,
            validation: IndexValidation::default(),
            keep_alive: Vec::new(),
        })
    }

    /// Create a tensor over caller-owned values
    ///
    /// The tensor has no allocator, so its representation must also be bound
    /// from caller-owned memory (`get_or_create_from_raw`).
    ///
    /// # Safety
    /// - `values` must point to `nnz` valid, aligned elements of `dtype` in the
    ///   memory described by `info` (null if `nnz == 0`)
    /// - The memory must outlive the tensor
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the dense shape or the values' byte size
    /// overflows.
    pub unsafe fn from_raw_values(
        dtype: DType,
        dense_shape: impl Into<Shape>,
        nnz: usize,
        values: *mut u8,
        info: MemoryInfo,
    ) -> Result<Self> {
        let dense_shape = checked_dense_shape(dense_shape.into())?;
        // SAFETY: forwarded from the caller's contract.
        let values = unsafe { Tensor::from_raw(dtype, [nnz], values, info)? };
        Ok(Self {
            dense_shape,
            nnz,
            values,
            allocator: None,
            rep: None,
            validation: IndexValidation::default(),
            keep_alive: Vec::new(),
        })
    }

    /// Set how builders check index buffers
    pub fn with_index_validation(mut self, validation: IndexValidation) -> Self {
        self.validation = validation;
        self
    }

    // =========================================================================
    // Properties
    // =========================================================================

    /// Shape of the dense array this tensor encodes
    #[inline]
    pub fn dense_shape(&self) -> &Shape {
        &self.dense_shape
    }

    /// Dense shape as `i64`s, for host bindings
    pub fn dense_shape_i64(&self) -> Vec<i64> {
        self.dense_shape.to_i64_vec()
    }

    /// Element type of the values
    #[inline]
    pub fn dtype(&self) -> DType {
        self.values.dtype()
    }

    /// Number of stored values
    #[inline]
    pub fn nnz(&self) -> usize {
        self.nnz
    }

    /// Values buffer (length `nnz`)
    #[inline]
    pub fn values(&self) -> &Tensor {
        &self.values
    }

    /// Mutable values buffer
    #[inline]
    pub fn mutable_values(&mut self) -> &mut Tensor {
        &mut self.values
    }

    /// Where the values live
    #[inline]
    pub fn location(&self) -> &MemoryInfo {
        self.values.location()
    }

    /// Allocator used for owned buffers, if any
    #[inline]
    pub fn allocator(&self) -> Option<&AllocatorPtr> {
        self.allocator.as_ref()
    }

    /// Index validation policy
    #[inline]
    pub fn index_validation(&self) -> IndexValidation {
        self.validation
    }

    /// Format of the bound representation, if any
    #[inline]
    pub fn format(&self) -> Option<SparseFormat> {
        self.rep.as_ref().map(SparseRep::format)
    }

    /// Format flags word: 0, or exactly the bound format's bit
    #[inline]
    pub fn format_flags(&self) -> u32 {
        self.format().map_or(0, SparseFormat::flag)
    }

    /// True if a representation is bound
    #[inline]
    pub fn is_bound(&self) -> bool {
        self.rep.is_some()
    }

    // =========================================================================
    // Representation slot
    // =========================================================================

    /// The bound representation, if any
    #[inline]
    pub fn rep(&self) -> Option<&SparseRep> {
        self.rep.as_ref()
    }

    /// Typed view of the bound representation
    ///
    /// # Panics
    ///
    /// Panics if no representation is bound or it is not a `T`.
    pub fn get_rep<T: FormatRep>(&self) -> &T {
        match self.rep.as_ref().and_then(T::from_rep) {
            Some(rep) => rep,
            None => panic!("Expecting {} format, tensor has {}", T::FORMAT, self.describe_format()),
        }
    }

    /// Mutable typed view of the bound representation
    ///
    /// # Panics
    ///
    /// Panics if no representation is bound or it is not a `T`.
    pub fn get_rep_mut<T: FormatRep>(&mut self) -> &mut T {
        let bound = self.describe_format();
        match self.rep.as_mut().and_then(T::from_rep_mut) {
            Some(rep) => rep,
            None => panic!("Expecting {} format, tensor has {bound}", T::FORMAT),
        }
    }

    /// Builder for representation `B::Rep`
    ///
    /// # Panics
    ///
    /// Panics if a representation of another format is already bound.
    pub fn rep_builder<'a, B: RepBuilder<'a>>(&'a mut self) -> B {
        if let Some(format) = self.format() {
            assert_eq!(
                format,
                <B::Rep as FormatRep>::FORMAT,
                "Expecting {} format set, tensor is bound as {format}",
                <B::Rep as FormatRep>::FORMAT
            );
        }
        B::bind(self)
    }

    /// Builder for the CSR/CSC representation
    ///
    /// Once a representation is bound, its builder calls ignore the shape and
    /// buffer arguments and return the bound one. The exception is `order`:
    /// CSR and CSC are distinct to callers, so asking for the other order
    /// panics.
    pub fn csrc_builder(&mut self) -> SparseCsrcBuilder<'_> {
        self.rep_builder()
    }

    /// Builder for the COO representation
    pub fn coo_builder(&mut self) -> SparseCooBuilder<'_> {
        self.rep_builder()
    }

    /// Check the bound representation against the dense shape and nnz
    ///
    /// Useful after filling owned index buffers. Runs regardless of the
    /// validation policy; does nothing if no representation is bound.
    pub fn validate(&self) -> Result<()> {
        match &self.rep {
            Some(rep) => rep.validate(&self.dense_shape, self.nnz),
            None => Ok(()),
        }
    }

    pub(crate) fn bind_rep<T: FormatRep>(&mut self, rep: T) -> &mut T {
        debug_assert!(self.rep.is_none(), "representation already bound");
        tracing::debug!(
            format = T::FORMAT.name(),
            nnz = self.nnz,
            dense_shape = %self.dense_shape,
            memory = %self.location(),
            "bound sparse representation"
        );
        let slot = self.rep.insert(rep.into_rep());
        match T::from_rep_mut(slot) {
            Some(rep) => rep,
            None => unreachable!("freshly bound representation has format {}", T::FORMAT),
        }
    }

    pub(super) fn keep_alive(&mut self, holder: Box<dyn Any + Send + Sync>) {
        self.keep_alive.push(holder);
    }

    fn describe_format(&self) -> &'static str {
        self.format().map_or("no representation", |f| f.name())
    }
}

/// Dense shapes must have an element count that fits in `usize`
fn checked_dense_shape(dense_shape: Shape) -> Result<Shape> {
    match dense_shape.checked_numel() {
        Some(_) => Ok(dense_shape),
        None => Err(Error::invalid_argument(
            "dense_shape",
            format!("{dense_shape} has more elements than usize can count"),
        )),
    }
}

impl std::fmt::Debug for SparseTensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SparseTensor")
            .field("dense_shape", &self.dense_shape)
            .field("dtype", &self.dtype())
            .field("nnz", &self.nnz)
            .field("format", &self.format())
            .field("validation", &self.validation)
            .field("rep", &self.rep)
            .finish()
    }
}
