//! CSR/CSC (compressed sparse row/column) format

mod builder;
mod rep;

pub use builder::SparseCsrcBuilder;
pub use rep::{CsrcOrder, SparseCsrcFormatRep};
