//! Storage: a single-owner region of raw memory, owned or aliased

use crate::error::Result;
use crate::runtime::{AllocatorPtr, MemoryInfo};

/// Raw memory backing a tensor
///
/// Storage is either *owned* (allocated from an allocator and returned to it
/// on drop) or *aliased* (wraps memory someone else owns and never frees
/// it). Owned storage is uniquely owned by one tensor; there is no sharing.
pub struct Storage {
    /// Raw address (CPU pointer or device address cast to u64)
    ptr: u64,
    /// Size in bytes
    size_bytes: usize,
    /// Where the memory lives
    info: MemoryInfo,
    /// Present iff the memory is owned
    allocator: Option<AllocatorPtr>,
}

impl Storage {
    /// Allocate `size_bytes` from `allocator`
    pub fn allocate(size_bytes: usize, allocator: &AllocatorPtr) -> Result<Self> {
        let ptr = allocator.allocate(size_bytes)?;
        Ok(Self {
            ptr,
            size_bytes,
            info: allocator.memory_info().clone(),
            allocator: Some(AllocatorPtr::clone(allocator)),
        })
    }

    /// Wrap existing memory without taking ownership
    ///
    /// # Safety
    /// - `ptr` must address at least `size_bytes` valid bytes in `info`'s
    ///   memory space (or be 0 when `size_bytes == 0`)
    /// - The memory must remain valid for the lifetime of this Storage
    /// - Caller is responsible for eventual deallocation
    pub unsafe fn from_ptr(ptr: u64, size_bytes: usize, info: MemoryInfo) -> Self {
        Self {
            ptr,
            size_bytes,
            info,
            allocator: None,
        }
    }

    /// Get the raw address
    #[inline]
    pub fn ptr(&self) -> u64 {
        self.ptr
    }

    /// Get size in bytes
    #[inline]
    pub fn size_in_bytes(&self) -> usize {
        self.size_bytes
    }

    /// Where the memory lives
    #[inline]
    pub fn memory_info(&self) -> &MemoryInfo {
        &self.info
    }

    /// True if this storage frees its memory on drop
    #[inline]
    pub fn is_owned(&self) -> bool {
        self.allocator.is_some()
    }

    /// The allocator that owns this memory, if owned
    #[inline]
    pub fn allocator(&self) -> Option<&AllocatorPtr> {
        self.allocator.as_ref()
    }
}

impl Drop for Storage {
    fn drop(&mut self) {
        if let Some(allocator) = &self.allocator {
            allocator.deallocate(self.ptr, self.size_bytes);
        }
    }
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage")
            .field("ptr", &format!("0x{:x}", self.ptr))
            .field("size_bytes", &self.size_bytes)
            .field("info", &self.info)
            .field("owned", &self.is_owned())
            .finish()
    }
}

// SAFETY: Storage is a unique handle to its memory region; access to the bytes
// goes through &self / &mut self on the owning Tensor.
unsafe impl Send for Storage {}
// SAFETY: shared references only permit reads of the region.
unsafe impl Sync for Storage {}
