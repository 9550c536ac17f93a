//! Local disk backend rooted at the configured server root

use log::{debug, error};
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Component, Path, PathBuf};

use super::filesystem::{DirEntry, FileHandle, Filesystem};

pub struct LocalFilesystem {
    root: PathBuf,
}

impl LocalFilesystem {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a virtual path below the root, refusing anything that climbs out
    fn real_path(&self, virtual_path: &str) -> io::Result<PathBuf> {
        let relative = Path::new(virtual_path.trim_start_matches('/'));
        let mut real = self.root.clone();
        for component in relative.components() {
            match component {
                Component::Normal(part) => real.push(part),
                Component::CurDir => {}
                _ => {
                    return Err(io::Error::new(
                        io::ErrorKind::PermissionDenied,
                        format!("path escapes server root: {virtual_path}"),
                    ));
                }
            }
        }
        Ok(real)
    }
}

impl Filesystem for LocalFilesystem {
    fn exists(&self, path: &str) -> bool {
        self.real_path(path).map(|p| p.exists()).unwrap_or(false)
    }

    fn remove(&self, path: &str) -> io::Result<()> {
        let real = self.real_path(path)?;
        fs::remove_file(&real)?;
        debug!("Removed {} (real: {})", path, real.display());
        Ok(())
    }

    fn rename(&self, from: &str, to: &str) -> io::Result<()> {
        fs::rename(self.real_path(from)?, self.real_path(to)?)
    }

    fn open_read(&self, path: &str) -> io::Result<Box<dyn FileHandle>> {
        let real = self.real_path(path)?;
        let file = File::open(&real)?;
        let metadata = file.metadata()?;
        if metadata.is_dir() {
            return Err(io::Error::other(format!("{path} is a directory")));
        }
        Ok(Box::new(LocalFile {
            file: Some(file),
            size: metadata.len(),
        }))
    }

    fn open_write(&self, path: &str) -> io::Result<Box<dyn FileHandle>> {
        let file = File::create(self.real_path(path)?)?;
        Ok(Box::new(LocalFile {
            file: Some(file),
            size: 0,
        }))
    }

    fn list_entries(&self, dir: &str) -> io::Result<Vec<DirEntry>> {
        let real = self.real_path(dir)?;
        let mut entries = Vec::new();
        for entry in fs::read_dir(&real)? {
            let entry = entry?;
            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(e) => {
                    error!("Skipping {:?}: {}", entry.file_name(), e);
                    continue;
                }
            };
            entries.push(DirEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                size: if metadata.is_dir() { 0 } else { metadata.len() },
                is_dir: metadata.is_dir(),
                modified: metadata.modified().ok(),
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}

struct LocalFile {
    file: Option<File>,
    size: u64,
}

impl LocalFile {
    fn file(&mut self) -> io::Result<&mut File> {
        self.file
            .as_mut()
            .ok_or_else(|| io::Error::other("file already closed"))
    }
}

impl FileHandle for LocalFile {
    fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file()?.read(buf)
    }

    fn write_chunk(&mut self, buf: &[u8]) -> io::Result<()> {
        self.file()?.write_all(buf)?;
        self.size += buf.len() as u64;
        Ok(())
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn close(&mut self) {
        if let Some(mut file) = self.file.take() {
            if let Err(e) = file.flush() {
                error!("Failed to flush file on close: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> (tempfile::TempDir, LocalFilesystem) {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("hello.txt"), b"hello world").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        let fs = LocalFilesystem::new(dir.path());
        (dir, fs)
    }

    #[test]
    fn lists_files_and_directories() {
        let (_dir, fs) = fixture();
        let entries = fs.list_entries("/").unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "hello.txt");
        assert_eq!(entries[0].size, 11);
        assert!(!entries[0].is_dir);
        assert!(entries[1].is_dir);
    }

    #[test]
    fn reads_and_writes_through_handles() {
        let (_dir, fs) = fixture();
        let mut reader = fs.open_read("/hello.txt").unwrap();
        assert_eq!(reader.size(), 11);
        let mut buf = [0u8; 5];
        assert_eq!(reader.read_chunk(&mut buf).unwrap(), 5);
        assert_eq!(&buf, b"hello");
        reader.close();
        assert!(reader.read_chunk(&mut buf).is_err());

        let mut writer = fs.open_write("/sub/new.bin").unwrap();
        writer.write_chunk(b"abc").unwrap();
        writer.close();
        assert!(fs.exists("/sub/new.bin"));
        assert_eq!(fs.open_read("/sub/new.bin").unwrap().size(), 3);
    }

    #[test]
    fn refuses_paths_outside_root() {
        let (_dir, fs) = fixture();
        assert!(!fs.exists("/../etc/passwd"));
        assert!(fs.open_read("/sub/../../x").is_err());
    }

    #[test]
    fn renames_and_removes() {
        let (_dir, fs) = fixture();
        fs.rename("/hello.txt", "/bye.txt").unwrap();
        assert!(!fs.exists("/hello.txt"));
        fs.remove("/bye.txt").unwrap();
        assert!(!fs.exists("/bye.txt"));
        assert!(fs.remove("/bye.txt").is_err());
    }

    #[test]
    fn directories_cannot_be_opened_as_files() {
        let (_dir, fs) = fixture();
        assert!(fs.open_read("/sub").is_err());
    }
}
