//! Tensor types
//!
//! This module provides the dense buffer primitive the sparse representations
//! are built from: a dtype, a shape and owned-or-aliased storage.

mod core;
mod shape;
mod storage;

pub use core::Tensor;
pub use shape::Shape;
pub use storage::Storage;
