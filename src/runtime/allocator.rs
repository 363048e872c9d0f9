//! Memory allocator trait and host implementations
//!
//! Allocators hand out raw addresses (`u64`) in the memory space described by
//! their `MemoryInfo`. Failure is always reported as `Error::OutOfMemory`.

use super::memory::MemoryInfo;
use crate::error::{Error, Result};
use std::alloc::{Layout as AllocLayout, alloc_zeroed, dealloc};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Alignment of every host allocation (AVX-512 friendly)
const HOST_ALIGN: usize = 64;

/// Memory allocator trait
///
/// Object safe so that tensors can hold whichever allocator the caller chose.
pub trait Allocator: Send + Sync + fmt::Debug {
    /// Memory space this allocator serves
    fn memory_info(&self) -> &MemoryInfo;

    /// Allocate `size_bytes` zero-initialized bytes
    ///
    /// A zero-byte request returns address 0 without allocating.
    fn allocate(&self, size_bytes: usize) -> Result<u64>;

    /// Deallocate memory previously returned by `allocate`
    fn deallocate(&self, ptr: u64, size_bytes: usize);

    /// Get the total allocated bytes
    fn allocated_bytes(&self) -> usize {
        0 // Default: tracking not supported
    }
}

/// Shared handle to an allocator
pub type AllocatorPtr = Arc<dyn Allocator>;

/// Heap allocator for host-accessible memory
///
/// Defaults to plain host memory; `with_memory_info` relabels it, e.g. to
/// serve a pinned host arena.
#[derive(Debug)]
pub struct CpuAllocator {
    info: MemoryInfo,
    allocated: AtomicUsize,
}

impl CpuAllocator {
    /// Create a host allocator
    pub fn new() -> Self {
        Self::with_memory_info(MemoryInfo::cpu())
    }

    /// Create a host allocator reporting a custom memory descriptor
    ///
    /// # Panics
    ///
    /// Panics if `info` is not host accessible: this allocator hands out
    /// host heap addresses.
    pub fn with_memory_info(info: MemoryInfo) -> Self {
        assert!(
            info.is_host_accessible(),
            "CpuAllocator cannot serve non-host memory {info}"
        );
        Self {
            info,
            allocated: AtomicUsize::new(0),
        }
    }

    /// Create a shared handle
    pub fn shared() -> AllocatorPtr {
        Arc::new(Self::new())
    }
}

impl Default for CpuAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl Allocator for CpuAllocator {
    fn memory_info(&self) -> &MemoryInfo {
        &self.info
    }

    fn allocate(&self, size_bytes: usize) -> Result<u64> {
        if size_bytes == 0 {
            return Ok(0);
        }

        let oom = || Error::OutOfMemory {
            allocator: self.info.to_string(),
            size: size_bytes,
        };
        let layout = AllocLayout::from_size_align(size_bytes, HOST_ALIGN).map_err(|_| oom())?;
        // SAFETY: layout has non-zero size.
        let ptr = unsafe { alloc_zeroed(layout) };
        if ptr.is_null() {
            return Err(oom());
        }

        self.allocated.fetch_add(size_bytes, Ordering::Relaxed);
        Ok(ptr as u64)
    }

    fn deallocate(&self, ptr: u64, size_bytes: usize) {
        if ptr == 0 || size_bytes == 0 {
            return;
        }

        // allocate() already validated this layout for the same size
        let Ok(layout) = AllocLayout::from_size_align(size_bytes, HOST_ALIGN) else {
            return;
        };
        // SAFETY: ptr came from alloc_zeroed with this exact layout.
        unsafe {
            dealloc(ptr as *mut u8, layout);
        }
        self.allocated.fetch_sub(size_bytes, Ordering::Relaxed);
    }

    fn allocated_bytes(&self) -> usize {
        self.allocated.load(Ordering::Relaxed)
    }
}

/// Allocator with a fixed byte budget on top of another allocator
///
/// Models a bounded pool: requests beyond the remaining budget fail with
/// `Error::OutOfMemory` instead of reaching the inner allocator.
#[derive(Debug)]
pub struct LimitedAllocator {
    inner: AllocatorPtr,
    limit: usize,
    in_use: AtomicUsize,
}

impl LimitedAllocator {
    /// Wrap `inner`, allowing at most `limit` live bytes
    pub fn new(inner: AllocatorPtr, limit: usize) -> Self {
        Self {
            inner,
            limit,
            in_use: AtomicUsize::new(0),
        }
    }

    /// Budget in bytes
    pub fn limit(&self) -> usize {
        self.limit
    }
}

impl Allocator for LimitedAllocator {
    fn memory_info(&self) -> &MemoryInfo {
        self.inner.memory_info()
    }

    fn allocate(&self, size_bytes: usize) -> Result<u64> {
        if size_bytes == 0 {
            return Ok(0);
        }

        let reserved = self
            .in_use
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |used| {
                used.checked_add(size_bytes).filter(|&n| n <= self.limit)
            });
        if reserved.is_err() {
            tracing::debug!(
                requested = size_bytes,
                limit = self.limit,
                "allocation exceeds pool budget"
            );
            return Err(Error::OutOfMemory {
                allocator: self.memory_info().to_string(),
                size: size_bytes,
            });
        }

        self.inner.allocate(size_bytes).inspect_err(|_| {
            self.in_use.fetch_sub(size_bytes, Ordering::AcqRel);
        })
    }

    fn deallocate(&self, ptr: u64, size_bytes: usize) {
        if ptr == 0 || size_bytes == 0 {
            return;
        }
        self.inner.deallocate(ptr, size_bytes);
        self.in_use.fetch_sub(size_bytes, Ordering::AcqRel);
    }

    fn allocated_bytes(&self) -> usize {
        self.in_use.load(Ordering::Acquire)
    }
}
