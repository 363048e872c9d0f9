//! Core Tensor type: typed, shaped memory

use super::{Shape, Storage};
use crate::dtype::{DType, Element};
use crate::error::{Error, Result};
use crate::runtime::{AllocatorPtr, MemoryInfo};

/// Typed, shaped region of memory
///
/// A tensor owns its `Storage`, which is either allocator-owned or an alias
/// of caller-supplied memory. Tensors are contiguous and row-major.
#[derive(Debug)]
pub struct Tensor {
    dtype: DType,
    shape: Shape,
    storage: Storage,
}

impl Tensor {
    /// Allocate a zero-initialized tensor
    pub fn new(dtype: DType, shape: impl Into<Shape>, allocator: &AllocatorPtr) -> Result<Self> {
        let shape = shape.into();
        let size_bytes = byte_size(dtype, &shape)?;
        let storage = Storage::allocate(size_bytes, allocator)?;
        Ok(Self {
            dtype,
            shape,
            storage,
        })
    }

    /// Allocate a tensor and fill it from a host slice
    ///
    /// Requires a host-accessible allocator.
    pub fn from_slice<T: Element>(
        data: &[T],
        shape: impl Into<Shape>,
        allocator: &AllocatorPtr,
    ) -> Result<Self> {
        let shape = shape.into();
        if shape.numel() != data.len() {
            return Err(Error::shape_mismatch(&[shape.numel()], &[data.len()]));
        }
        let mut tensor = Self::new(T::DTYPE, shape, allocator)?;
        tensor.as_mut_slice::<T>()?.copy_from_slice(data);
        Ok(tensor)
    }

    /// Wrap caller-owned memory without copying or taking ownership
    ///
    /// # Safety
    /// - `ptr` must address `shape.numel() * dtype.size_in_bytes()` valid bytes
    ///   in the memory space described by `info`, suitably aligned for `dtype`
    /// - `ptr` may be null only when the shape has zero elements
    /// - The memory must outlive the returned tensor and must not be accessed
    ///   through other paths while the tensor is mutated
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the byte size of `shape` overflows.
    pub unsafe fn from_raw(
        dtype: DType,
        shape: impl Into<Shape>,
        ptr: *mut u8,
        info: MemoryInfo,
    ) -> Result<Self> {
        let shape = shape.into();
        let size_bytes = byte_size(dtype, &shape)?;
        // SAFETY: forwarded from the caller's contract.
        let storage = unsafe { Storage::from_ptr(ptr as u64, size_bytes, info) };
        Ok(Self {
            dtype,
            shape,
            storage,
        })
    }

    /// Element type
    #[inline]
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Shape
    #[inline]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Number of dimensions
    #[inline]
    pub fn ndim(&self) -> usize {
        self.shape.ndim()
    }

    /// Number of elements
    #[inline]
    pub fn numel(&self) -> usize {
        self.shape.numel()
    }

    /// Size in bytes
    #[inline]
    pub fn size_in_bytes(&self) -> usize {
        self.storage.size_in_bytes()
    }

    /// Where the data lives
    #[inline]
    pub fn location(&self) -> &MemoryInfo {
        self.storage.memory_info()
    }

    /// Underlying storage
    #[inline]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// True if the tensor owns (and will free) its memory
    #[inline]
    pub fn owns_buffer(&self) -> bool {
        self.storage.is_owned()
    }

    /// Raw address of the first element
    #[inline]
    pub fn data_ptr(&self) -> u64 {
        self.storage.ptr()
    }

    fn check_host_view<T: Element>(&self) -> Result<()> {
        if T::DTYPE != self.dtype {
            return Err(Error::DTypeMismatch {
                lhs: self.dtype,
                rhs: T::DTYPE,
            });
        }
        if !self.location().is_host_accessible() {
            return Err(Error::NotHostAccessible {
                memory: self.location().to_string(),
            });
        }
        Ok(())
    }

    /// Host view of the elements
    pub fn as_slice<T: Element>(&self) -> Result<&[T]> {
        self.check_host_view::<T>()?;
        let len = self.numel();
        if len == 0 {
            return Ok(&[]);
        }
        // SAFETY: dtype matches T, memory is host accessible and holds `len`
        // elements per the construction contract; &self prevents mutation.
        Ok(unsafe { std::slice::from_raw_parts(self.data_ptr() as *const T, len) })
    }

    /// Mutable host view of the elements
    pub fn as_mut_slice<T: Element>(&mut self) -> Result<&mut [T]> {
        self.check_host_view::<T>()?;
        let len = self.numel();
        if len == 0 {
            return Ok(&mut []);
        }
        // SAFETY: as in as_slice; &mut self guarantees exclusivity.
        Ok(unsafe { std::slice::from_raw_parts_mut(self.data_ptr() as *mut T, len) })
    }

    /// Copy the elements to a host vector
    pub fn to_vec<T: Element>(&self) -> Result<Vec<T>> {
        self.as_slice::<T>().map(<[T]>::to_vec)
    }
}

/// Bytes needed for `shape` elements of `dtype`, at most `isize::MAX`
fn byte_size(dtype: DType, shape: &Shape) -> Result<usize> {
    shape
        .checked_numel()
        .and_then(|n| n.checked_mul(dtype.size_in_bytes()))
        .filter(|&bytes| bytes <= isize::MAX as usize)
        .ok_or_else(|| {
            Error::invalid_argument(
                "shape",
                format!("{shape} elements of {dtype} exceed the addressable size"),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{CpuAllocator, MemoryInfo};

    #[test]
    fn test_new_is_zeroed() {
        let alloc = CpuAllocator::shared();
        let t = Tensor::new(DType::I64, [3], &alloc).unwrap();
        assert_eq!(t.to_vec::<i64>().unwrap(), vec![0, 0, 0]);
        assert_eq!(t.size_in_bytes(), 24);
        assert!(t.owns_buffer());
    }

    #[test]
    fn test_from_slice_shape_mismatch() {
        let alloc = CpuAllocator::shared();
        let err = Tensor::from_slice(&[1.0f32, 2.0], [3], &alloc).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));
    }

    #[test]
    fn test_dtype_checked_views() {
        let alloc = CpuAllocator::shared();
        let t = Tensor::from_slice(&[1.0f32, 2.0], [2], &alloc).unwrap();
        assert!(matches!(
            t.as_slice::<i64>(),
            Err(Error::DTypeMismatch { .. })
        ));
        assert_eq!(t.as_slice::<f32>().unwrap(), &[1.0, 2.0]);
    }

    #[test]
    fn test_overflowing_size_is_rejected() {
        let alloc = CpuAllocator::shared();
        let err = Tensor::new(DType::I64, [usize::MAX / 4], &alloc).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { arg: "shape", .. }));
        assert!(Tensor::new(DType::F32, [usize::MAX, 2], &alloc).is_err());
        assert_eq!(alloc.allocated_bytes(), 0);

        let raw = unsafe {
            Tensor::from_raw(
                DType::F64,
                [usize::MAX / 8 + 1],
                std::ptr::null_mut(),
                MemoryInfo::cpu(),
            )
        };
        assert!(matches!(raw, Err(Error::InvalidArgument { .. })));
    }

    #[test]
    fn test_device_memory_not_host_viewable() {
        let t = unsafe {
            Tensor::from_raw(
                DType::I64,
                [0],
                std::ptr::null_mut(),
                MemoryInfo::device("Cuda", 0),
            )
        }
        .unwrap();
        assert!(matches!(
            t.as_slice::<i64>(),
            Err(Error::NotHostAccessible { .. })
        ));
    }

    #[test]
    fn test_aliased_writes_are_visible() {
        let mut data = vec![1i64, 2, 3];
        {
            let mut t = unsafe {
                Tensor::from_raw(
                    DType::I64,
                    [3],
                    data.as_mut_ptr() as *mut u8,
                    MemoryInfo::cpu(),
                )
            }
            .unwrap();
            assert!(!t.owns_buffer());
            t.as_mut_slice::<i64>().unwrap()[1] = 42;
        }
        assert_eq!(data, vec![1, 42, 3]);
    }
}
