//! Copying a SparseTensor across allocators and memory spaces

use crate::error::Result;
use crate::runtime::{AllocatorPtr, DataTransfer, DataTransferManager, ExecQueue, TensorCopier};

use super::super::rep::copy_tensor_to;
use super::core::SparseTensor;

impl SparseTensor {
    /// Deep copy onto `allocator`, choosing the transfer per buffer
    ///
    /// Values and the bound representation (if any) are copied into memory
    /// owned by the result. The source is not modified. Returns only after
    /// every buffer has been copied.
    pub fn copy_to(
        &self,
        manager: &DataTransferManager,
        allocator: &AllocatorPtr,
        queue: ExecQueue,
    ) -> Result<SparseTensor> {
        self.copy_via(manager, allocator, queue)
    }

    /// Deep copy onto `allocator` with a specific transfer
    pub fn copy_to_with(
        &self,
        transfer: &dyn DataTransfer,
        allocator: &AllocatorPtr,
        queue: ExecQueue,
    ) -> Result<SparseTensor> {
        self.copy_via(transfer, allocator, queue)
    }

    fn copy_via<C: TensorCopier + ?Sized>(
        &self,
        copier: &C,
        allocator: &AllocatorPtr,
        queue: ExecQueue,
    ) -> Result<SparseTensor> {
        let values = copy_tensor_to(&self.values, copier, allocator, queue)?;
        let rep = self
            .rep
            .as_ref()
            .map(|rep| rep.copy_via(copier, allocator, queue))
            .transpose()?;

        tracing::debug!(
            format = ?self.format(),
            nnz = self.nnz,
            src = %self.location(),
            dst = %allocator.memory_info(),
            %queue,
            "copied sparse tensor"
        );
        Ok(SparseTensor {
            dense_shape: self.dense_shape.clone(),
            nnz: self.nnz,
            values,
            allocator: Some(AllocatorPtr::clone(allocator)),
            rep,
            validation: self.validation,
            keep_alive: Vec::new(),
        })
    }
}
