//! Data transfer between memory spaces

use super::memory::{ExecQueue, MemoryInfo};
use crate::error::{Error, Result};
use crate::tensor::Tensor;
use std::fmt;

/// Copies tensor contents between a set of memory kinds
pub trait DataTransfer: Send + Sync + fmt::Debug {
    /// Human-readable name of this transfer
    fn name(&self) -> &'static str;

    /// True if this transfer can copy from `src` memory to `dst` memory
    fn can_copy(&self, src: &MemoryInfo, dst: &MemoryInfo) -> bool;

    /// Copy all bytes of `src` into `dst`
    ///
    /// Returns once the copy is complete, even if it was issued on an
    /// asynchronous `queue`.
    fn copy_tensor(&self, src: &Tensor, dst: &mut Tensor, queue: ExecQueue) -> Result<()>;
}

/// Anything that can copy one tensor into another
///
/// Implemented by `DataTransferManager` (which selects a transfer per copy)
/// and by every concrete `DataTransfer`, so copy routines can accept either.
pub trait TensorCopier {
    /// Copy all bytes of `src` into `dst`
    fn transfer(&self, src: &Tensor, dst: &mut Tensor, queue: ExecQueue) -> Result<()>;
}

impl<T: DataTransfer + ?Sized> TensorCopier for T {
    fn transfer(&self, src: &Tensor, dst: &mut Tensor, queue: ExecQueue) -> Result<()> {
        if !self.can_copy(src.location(), dst.location()) {
            return Err(Error::UnsupportedTransfer {
                src: src.location().to_string(),
                dst: dst.location().to_string(),
            });
        }
        self.copy_tensor(src, dst, queue)
    }
}

fn check_compatible(src: &Tensor, dst: &Tensor) -> Result<()> {
    if src.dtype() != dst.dtype() {
        return Err(Error::DTypeMismatch {
            lhs: src.dtype(),
            rhs: dst.dtype(),
        });
    }
    if src.size_in_bytes() != dst.size_in_bytes() {
        return Err(Error::shape_mismatch(src.shape(), dst.shape()));
    }
    Ok(())
}

/// Transfer between host-accessible memory kinds (host and pinned host)
#[derive(Debug, Default, Clone, Copy)]
pub struct CpuDataTransfer;

impl DataTransfer for CpuDataTransfer {
    fn name(&self) -> &'static str {
        "cpu"
    }

    fn can_copy(&self, src: &MemoryInfo, dst: &MemoryInfo) -> bool {
        src.is_host_accessible() && dst.is_host_accessible()
    }

    fn copy_tensor(&self, src: &Tensor, dst: &mut Tensor, queue: ExecQueue) -> Result<()> {
        check_compatible(src, dst)?;
        let size_bytes = src.size_in_bytes();
        tracing::trace!(bytes = size_bytes, %queue, "host copy");
        if size_bytes == 0 || src.data_ptr() == dst.data_ptr() {
            return Ok(());
        }

        // SAFETY: both buffers are host accessible and hold size_bytes bytes;
        // dst is borrowed mutably. Aliased tensors may overlap, hence `copy`.
        unsafe {
            std::ptr::copy(
                src.data_ptr() as *const u8,
                dst.data_ptr() as *mut u8,
                size_bytes,
            );
        }
        Ok(())
    }
}

/// Registry of transfers, selecting one per (source, destination) pair
///
/// Transfers are consulted in registration order; the first whose
/// `can_copy` accepts the pair wins.
#[derive(Debug, Default)]
pub struct DataTransferManager {
    transfers: Vec<Box<dyn DataTransfer>>,
}

impl DataTransferManager {
    /// Create an empty manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a manager with the host transfer registered
    pub fn with_defaults() -> Self {
        let mut manager = Self::new();
        manager.register(Box::new(CpuDataTransfer));
        manager
    }

    /// Register a transfer
    pub fn register(&mut self, transfer: Box<dyn DataTransfer>) {
        tracing::debug!(transfer = transfer.name(), "registered data transfer");
        self.transfers.push(transfer);
    }

    /// Number of registered transfers
    pub fn len(&self) -> usize {
        self.transfers.len()
    }

    /// True if no transfer is registered
    pub fn is_empty(&self) -> bool {
        self.transfers.is_empty()
    }

    /// Find a transfer able to copy from `src` to `dst`
    pub fn get_transfer(&self, src: &MemoryInfo, dst: &MemoryInfo) -> Option<&dyn DataTransfer> {
        self.transfers
            .iter()
            .find(|t| t.can_copy(src, dst))
            .map(|t| t.as_ref())
    }

    /// Copy `src` into `dst` with whichever transfer handles the pair
    pub fn copy_tensor(&self, src: &Tensor, dst: &mut Tensor, queue: ExecQueue) -> Result<()> {
        let transfer = self
            .get_transfer(src.location(), dst.location())
            .ok_or_else(|| Error::UnsupportedTransfer {
                src: src.location().to_string(),
                dst: dst.location().to_string(),
            })?;
        transfer.copy_tensor(src, dst, queue)
    }
}

impl TensorCopier for DataTransferManager {
    fn transfer(&self, src: &Tensor, dst: &mut Tensor, queue: ExecQueue) -> Result<()> {
        self.copy_tensor(src, dst, queue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtype::DType;
    use crate::runtime::{AllocatorPtr, CpuAllocator};
    use std::sync::Arc;

    fn pinned_allocator() -> AllocatorPtr {
        Arc::new(CpuAllocator::with_memory_info(MemoryInfo::pinned(0)))
    }

    #[test]
    fn test_cpu_transfer_host_to_pinned() {
        let host = CpuAllocator::shared();
        let src = Tensor::from_slice(&[1i64, 2, 3], [3], &host).unwrap();
        let mut dst = Tensor::new(DType::I64, [3], &pinned_allocator()).unwrap();

        CpuDataTransfer
            .transfer(&src, &mut dst, ExecQueue::DEFAULT)
            .unwrap();
        assert_eq!(dst.to_vec::<i64>().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_cpu_transfer_size_mismatch() {
        let host = CpuAllocator::shared();
        let src = Tensor::from_slice(&[1i64, 2, 3], [3], &host).unwrap();
        let mut dst = Tensor::new(DType::I64, [2], &host).unwrap();
        let err = CpuDataTransfer
            .copy_tensor(&src, &mut dst, ExecQueue::DEFAULT)
            .unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));
    }

    #[test]
    fn test_manager_rejects_unknown_pair() {
        let manager = DataTransferManager::with_defaults();
        assert_eq!(manager.len(), 1);
        assert!(
            manager
                .get_transfer(&MemoryInfo::cpu(), &MemoryInfo::device("Cuda", 0))
                .is_none()
        );
        assert!(
            manager
                .get_transfer(&MemoryInfo::cpu(), &MemoryInfo::pinned(0))
                .is_some()
        );
    }

    #[test]
    fn test_empty_manager_fails() {
        let manager = DataTransferManager::new();
        assert!(manager.is_empty());
        let host = CpuAllocator::shared();
        let src = Tensor::from_slice(&[1.0f64], [1], &host).unwrap();
        let mut dst = Tensor::new(DType::F64, [1], &host).unwrap();
        let err = manager
            .copy_tensor(&src, &mut dst, ExecQueue::DEFAULT)
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedTransfer { .. }));
    }
}
