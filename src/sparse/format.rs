//! Sparse format identifiers and validation policy

/// Sparse storage format a tensor can be bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SparseFormat {
    /// Coordinate format (COO)
    ///
    /// One index entry per non-zero: either a linear offset into the dense
    /// shape or a full coordinate tuple.
    Coo,

    /// Compressed Sparse Row / Column (CSR or CSC)
    ///
    /// Outer start offsets per row (column) plus one inner index per non-zero.
    Csrc,
}

impl SparseFormat {
    /// Bit identifying this format in a format-flags word
    ///
    /// A tensor's flags have at most one of these bits set.
    #[inline]
    pub const fn flag(self) -> u32 {
        match self {
            SparseFormat::Coo => 0x1,
            SparseFormat::Csrc => 0x2,
        }
    }

    /// Returns the format name as a string
    pub fn name(&self) -> &'static str {
        match self {
            SparseFormat::Coo => "COO",
            SparseFormat::Csrc => "CSR(C)",
        }
    }
}

impl std::fmt::Display for SparseFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// How much a builder checks index buffers before binding them
///
/// Index checks cost O(nnz + outer) on the host. Skipping them means an
/// out-of-range index is only discovered, if at all, by whatever kernel
/// later reads the representation.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum IndexValidation {
    /// Check shapes and, for host-resident aliased buffers, index contents
    #[default]
    Strict,
    /// Trust the caller; bind buffers as given
    Trusted,
}

impl IndexValidation {
    /// True if checks should run
    #[inline]
    pub fn is_strict(self) -> bool {
        matches!(self, IndexValidation::Strict)
    }
}
