//! COO (coordinate) format

mod builder;
mod rep;

pub use builder::SparseCooBuilder;
pub use rep::SparseCooFormatRep;
