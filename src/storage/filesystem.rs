//! Filesystem seam
//!
//! Protocol code only speaks absolute virtual paths (`/dir/file`). How those
//! map onto real storage is entirely the backend's business.

use std::io;
use std::time::SystemTime;

/// One directory entry as reported by `Filesystem::list_entries`
#[derive(Debug, Clone, PartialEq)]
pub struct DirEntry {
    pub name: String,
    pub size: u64,
    pub is_dir: bool,
    pub modified: Option<SystemTime>,
}

/// An open file
pub trait FileHandle: Send {
    /// Read up to `buf.len()` bytes; `Ok(0)` means end of file
    fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    fn write_chunk(&mut self, buf: &[u8]) -> io::Result<()>;

    fn size(&self) -> u64;

    fn close(&mut self);
}

pub trait Filesystem: Send {
    fn exists(&self, path: &str) -> bool;

    fn remove(&self, path: &str) -> io::Result<()>;

    fn rename(&self, from: &str, to: &str) -> io::Result<()>;

    fn open_read(&self, path: &str) -> io::Result<Box<dyn FileHandle>>;

    /// Create or truncate
    fn open_write(&self, path: &str) -> io::Result<Box<dyn FileHandle>>;

    fn list_entries(&self, dir: &str) -> io::Result<Vec<DirEntry>>;
}
