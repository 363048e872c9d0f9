//! Memory spaces, allocators and data transfer
//!
//! # Architecture
//!
//! ```text
//! MemoryInfo (where a buffer lives: host, pinned host, device N)
//! ├── Allocator (allocates/frees bytes in one memory space)
//! ├── DataTransfer (copies buffers between a set of memory kinds)
//! └── DataTransferManager (picks a DataTransfer for a src/dst pair)
//! ```
//!
//! Allocators and transfers are chosen at runtime by the caller, so both are
//! used as trait objects (`AllocatorPtr`, `&dyn DataTransfer`).

mod allocator;
mod memory;
mod transfer;

pub use allocator::{Allocator, AllocatorPtr, CpuAllocator, LimitedAllocator};
pub use memory::{ExecQueue, MemoryInfo, MemoryKind};
pub use transfer::{CpuDataTransfer, DataTransfer, DataTransferManager, TensorCopier};
