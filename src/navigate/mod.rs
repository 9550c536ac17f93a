//! Navigate module
//!
//! Path resolution for command parameters.

mod operations;

pub use operations::resolve_path;
