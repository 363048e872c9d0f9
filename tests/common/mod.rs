//! Common test utilities
#![allow(dead_code)]

use sparse_rep::error::Result;
use sparse_rep::runtime::{
    Allocator, AllocatorPtr, CpuAllocator, DataTransfer, ExecQueue, MemoryInfo, MemoryKind,
};
use sparse_rep::tensor::Tensor;
use std::sync::{Arc, Mutex};

pub const SIM_DEVICE: &str = "SimGpu";

/// Allocator for a simulated accelerator
///
/// Memory is host heap underneath, but it is labelled as device memory so
/// host views and the host transfer refuse it.
#[derive(Debug)]
pub struct SimDeviceAllocator {
    info: MemoryInfo,
    heap: CpuAllocator,
}

impl SimDeviceAllocator {
    pub fn new(device_id: usize) -> Self {
        Self {
            info: MemoryInfo::device(SIM_DEVICE, device_id),
            heap: CpuAllocator::new(),
        }
    }

    pub fn shared(device_id: usize) -> AllocatorPtr {
        Arc::new(Self::new(device_id))
    }
}

impl Allocator for SimDeviceAllocator {
    fn memory_info(&self) -> &MemoryInfo {
        &self.info
    }

    fn allocate(&self, size_bytes: usize) -> Result<u64> {
        self.heap.allocate(size_bytes)
    }

    fn deallocate(&self, ptr: u64, size_bytes: usize) {
        self.heap.deallocate(ptr, size_bytes)
    }

    fn allocated_bytes(&self) -> usize {
        self.heap.allocated_bytes()
    }
}

fn is_sim_device(info: &MemoryInfo) -> bool {
    info.kind() == MemoryKind::Device && info.name() == SIM_DEVICE
}

/// Host <-> simulated device transfer that records the queues it ran on
#[derive(Debug, Default)]
pub struct SimDeviceTransfer {
    pub queues: Arc<Mutex<Vec<ExecQueue>>>,
}

impl DataTransfer for SimDeviceTransfer {
    fn name(&self) -> &'static str {
        "sim-gpu"
    }

    fn can_copy(&self, src: &MemoryInfo, dst: &MemoryInfo) -> bool {
        let reachable = |m: &MemoryInfo| is_sim_device(m) || m.is_host_accessible();
        (is_sim_device(src) || is_sim_device(dst)) && reachable(src) && reachable(dst)
    }

    fn copy_tensor(&self, src: &Tensor, dst: &mut Tensor, queue: ExecQueue) -> Result<()> {
        assert_eq!(src.size_in_bytes(), dst.size_in_bytes());
        self.queues.lock().unwrap().push(queue);
        if src.size_in_bytes() > 0 {
            unsafe {
                std::ptr::copy_nonoverlapping(
                    src.data_ptr() as *const u8,
                    dst.data_ptr() as *mut u8,
                    src.size_in_bytes(),
                );
            }
        }
        Ok(())
    }
}

/// Read an I64 tensor wherever it lives (simulated device memory is host
/// heap underneath)
pub fn read_i64(tensor: &Tensor) -> Vec<i64> {
    let mut out = vec![0i64; tensor.numel()];
    if !out.is_empty() {
        unsafe {
            std::ptr::copy_nonoverlapping(
                tensor.data_ptr() as *const i64,
                out.as_mut_ptr(),
                out.len(),
            );
        }
    }
    out
}
