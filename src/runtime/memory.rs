//! Memory descriptors and execution queue identifiers

use std::fmt;

/// Kind of memory a buffer lives in
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum MemoryKind {
    /// Ordinary pageable host memory
    #[default]
    Host,
    /// Page-locked host memory, addressable by the host and by DMA engines
    PinnedHost,
    /// Accelerator memory, not addressable by the host
    Device,
}

impl MemoryKind {
    /// Returns the kind name as a string
    pub fn name(&self) -> &'static str {
        match self {
            MemoryKind::Host => "host",
            MemoryKind::PinnedHost => "pinned",
            MemoryKind::Device => "device",
        }
    }
}

/// Describes where a buffer lives
///
/// Two buffers with equal `MemoryInfo` share an address space.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MemoryInfo {
    name: String,
    kind: MemoryKind,
    device_id: usize,
}

impl MemoryInfo {
    /// Create a memory descriptor
    pub fn new(name: impl Into<String>, kind: MemoryKind, device_id: usize) -> Self {
        Self {
            name: name.into(),
            kind,
            device_id,
        }
    }

    /// Default host memory descriptor
    pub fn cpu() -> Self {
        Self::new("Cpu", MemoryKind::Host, 0)
    }

    /// Pinned host memory associated with accelerator `device_id`
    pub fn pinned(device_id: usize) -> Self {
        Self::new("CpuPinned", MemoryKind::PinnedHost, device_id)
    }

    /// Accelerator memory of a named backend
    pub fn device(name: impl Into<String>, device_id: usize) -> Self {
        Self::new(name, MemoryKind::Device, device_id)
    }

    /// Allocator/backend name
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Memory kind
    #[inline]
    pub fn kind(&self) -> MemoryKind {
        self.kind
    }

    /// Device ordinal
    #[inline]
    pub fn device_id(&self) -> usize {
        self.device_id
    }

    /// True if the host can dereference pointers into this memory
    #[inline]
    pub fn is_host_accessible(&self) -> bool {
        matches!(self.kind, MemoryKind::Host | MemoryKind::PinnedHost)
    }
}

impl Default for MemoryInfo {
    fn default() -> Self {
        Self::cpu()
    }
}

impl fmt::Display for MemoryInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}({})", self.name, self.device_id, self.kind.name())
    }
}

/// Identifies the execution queue (stream) a transfer is issued on
///
/// Host transfers ignore it; asynchronous backends use it to pick a stream.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ExecQueue(pub u32);

impl ExecQueue {
    /// The default queue
    pub const DEFAULT: ExecQueue = ExecQueue(0);
}

impl fmt::Display for ExecQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "queue#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_accessibility() {
        assert!(MemoryInfo::cpu().is_host_accessible());
        assert!(MemoryInfo::pinned(1).is_host_accessible());
        assert!(!MemoryInfo::device("Cuda", 0).is_host_accessible());
    }

    #[test]
    fn test_memory_info_display() {
        assert_eq!(MemoryInfo::cpu().to_string(), "Cpu:0(host)");
        assert_eq!(MemoryInfo::device("Cuda", 1).to_string(), "Cuda:1(device)");
        assert_eq!(MemoryInfo::default(), MemoryInfo::cpu());
    }
}
