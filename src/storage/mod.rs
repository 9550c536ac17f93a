//! File storage
//!
//! The filesystem collaborator: a trait seam plus the local-disk backend.

pub mod filesystem;
pub mod local;

pub use filesystem::{DirEntry, FileHandle, Filesystem};
pub use local::LocalFilesystem;
