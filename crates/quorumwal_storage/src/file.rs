//! File-based storage backend for persistent logs.

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};
use parking_lot::RwLock;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// A file-based storage backend.
///
/// Data survives process restarts. Appends go to the end of the file;
/// the in-memory size mirror avoids a metadata syscall per write.
///
/// # Durability
///
/// - `flush()` calls `File::flush()` to push buffered data to the OS
/// - `sync()` calls `File::sync_all()` to ensure data and metadata are on disk
///
/// # Example
///
/// ```no_run
/// use quorumwal_storage::{StorageBackend, FileBackend};
/// use std::path::Path;
///
/// let mut backend = FileBackend::open(Path::new("wal.log")).unwrap();
/// backend.append(b"frame bytes").unwrap();
/// backend.sync().unwrap();
/// ```
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    file: RwLock<File>,
    size: RwLock<u64>,
}

impl FileBackend {
    /// Opens or creates a file backend at the given path.
    ///
    /// An existing file is opened for reading and appending; its current
    /// length becomes the append offset.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or created.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        let size = file.metadata()?.len();

        Ok(Self {
            path: path.to_path_buf(),
            file: RwLock::new(file),
            size: RwLock::new(size),
        })
    }

    /// Opens or creates a file backend, creating parent directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if directories cannot be created or the file cannot
    /// be opened.
    pub fn open_with_create_dirs(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::open(path)
    }

    /// Returns the path to the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StorageBackend for FileBackend {
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        let size = *self.size.read();
        let end = offset.saturating_add(len as u64);

        if offset > size || end > size {
            return Err(StorageError::ReadPastEnd { offset, len, size });
        }

        if len == 0 {
            return Ok(Vec::new());
        }

        let mut file = self.file.write();
        file.seek(SeekFrom::Start(offset))?;

        let mut buffer = vec![0u8; len];
        file.read_exact(&mut buffer)?;

        Ok(buffer)
    }

    fn append(&mut self, data: &[u8]) -> StorageResult<usize> {
        if data.is_empty() {
            return Ok(0);
        }

        let mut file = self.file.write();
        let mut size = self.size.write();

        file.seek(SeekFrom::End(0))?;
        file.write_all(data)?;
        *size += data.len() as u64;

        Ok(data.len())
    }

    fn flush(&mut self) -> StorageResult<()> {
        let mut file = self.file.write();
        file.flush()?;
        Ok(())
    }

    fn sync(&mut self) -> StorageResult<()> {
        let file = self.file.write();
        file.sync_all()?;
        Ok(())
    }

    fn size(&self) -> StorageResult<u64> {
        Ok(*self.size.read())
    }

    fn truncate(&mut self, new_size: u64) -> StorageResult<()> {
        let file = self.file.write();
        let mut size = self.size.write();

        if new_size > *size {
            return Err(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!(
                    "cannot truncate to size {} which is greater than current size {}",
                    new_size, *size
                ),
            )));
        }

        file.set_len(new_size)?;
        file.sync_all()?;
        *size = new_size;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn create_new_file_is_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wal.log");

        let backend = FileBackend::open(&path).unwrap();
        assert_eq!(backend.size().unwrap(), 0);
        assert!(path.exists());
    }

    #[test]
    fn append_reports_full_count() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wal.log");

        let mut backend = FileBackend::open(&path).unwrap();

        assert_eq!(backend.append(b"hello").unwrap(), 5);
        assert_eq!(backend.append(b" world").unwrap(), 6);
        assert_eq!(backend.size().unwrap(), 11);

        let data = backend.read_at(0, 11).unwrap();
        assert_eq!(&data, b"hello world");
    }

    #[test]
    fn read_past_end_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wal.log");

        let mut backend = FileBackend::open(&path).unwrap();
        backend.append(b"hello").unwrap();

        let result = backend.read_at(10, 5);
        assert!(matches!(result, Err(StorageError::ReadPastEnd { .. })));
    }

    #[test]
    fn data_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wal.log");

        {
            let mut backend = FileBackend::open(&path).unwrap();
            backend.append(b"persistent data").unwrap();
            backend.sync().unwrap();
        }

        {
            let backend = FileBackend::open(&path).unwrap();
            assert_eq!(backend.size().unwrap(), 15);
            assert_eq!(backend.read_at(0, 15).unwrap(), b"persistent data");
        }
    }

    #[test]
    fn reopen_appends_at_end() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wal.log");

        {
            let mut backend = FileBackend::open(&path).unwrap();
            backend.append(b"first").unwrap();
            backend.sync().unwrap();
        }

        {
            let mut backend = FileBackend::open(&path).unwrap();
            backend.append(b"second").unwrap();
            assert_eq!(backend.read_at(0, 11).unwrap(), b"firstsecond");
        }
    }

    #[test]
    fn create_with_nested_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("wal.log");

        let backend = FileBackend::open_with_create_dirs(&path).unwrap();
        assert_eq!(backend.size().unwrap(), 0);
        assert!(path.exists());
    }

    #[test]
    fn truncate_drops_tail() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wal.log");

        let mut backend = FileBackend::open(&path).unwrap();
        backend.append(b"hello world").unwrap();

        backend.truncate(5).unwrap();
        assert_eq!(backend.size().unwrap(), 5);
        assert_eq!(backend.read_at(0, 5).unwrap(), b"hello");
    }

    #[test]
    fn truncate_to_larger_size_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wal.log");

        let mut backend = FileBackend::open(&path).unwrap();
        backend.append(b"hello").unwrap();

        assert!(backend.truncate(100).is_err());
    }
}
