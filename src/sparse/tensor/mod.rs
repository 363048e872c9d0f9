//! SparseTensor container

mod copy;
mod core;
mod host;

pub use core::SparseTensor;
