//! Operations discovered in service definitions.

pub mod extractor;
pub mod operation;

pub use extractor::extract_operations;
pub use operation::Operation;
