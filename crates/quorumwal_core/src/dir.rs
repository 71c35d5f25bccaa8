//! WAL directory management.
//!
//! File system layout:
//!
//! ```text
//! <wal_path>/
//! ├─ LOCK       # Advisory lock for single-writer
//! └─ wal.log    # The append-only log
//! ```
//!
//! The LOCK file extends the single-writer-per-store invariant across
//! processes: within a process the store is exclusively owned by one writer,
//! and the lock prevents a second process from opening the same log.

use crate::error::{WalError, WalResult};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

const LOCK_FILE: &str = "LOCK";
const WAL_FILE: &str = "wal.log";

/// Owns a WAL directory and its exclusive advisory lock.
///
/// Only one `WalDir` instance can exist per directory at a time, across
/// processes. The lock is released when the instance is dropped.
#[derive(Debug)]
pub struct WalDir {
    /// Root directory path.
    path: PathBuf,
    /// Lock file handle (held for exclusive access).
    _lock_file: File,
}

impl WalDir {
    /// Opens or creates a WAL directory and takes its exclusive lock.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The directory doesn't exist and `create_if_missing` is false
    /// - Another process holds the lock (returns [`WalError::Locked`])
    /// - I/O errors occur (returned as [`WalError::StoreUnavailable`])
    pub fn open(path: &Path, create_if_missing: bool) -> WalResult<Self> {
        if !path.exists() {
            if create_if_missing {
                fs::create_dir_all(path)
                    .map_err(|e| WalError::store_unavailable(e.to_string()))?;
            } else {
                return Err(WalError::store_unavailable(format!(
                    "WAL directory does not exist: {}",
                    path.display()
                )));
            }
        }

        if !path.is_dir() {
            return Err(WalError::store_unavailable(format!(
                "path is not a directory: {}",
                path.display()
            )));
        }

        let lock_path = path.join(LOCK_FILE);
        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| WalError::store_unavailable(e.to_string()))?;

        if lock_file.try_lock_exclusive().is_err() {
            return Err(WalError::Locked);
        }

        Ok(Self {
            path: path.to_path_buf(),
            _lock_file: lock_file,
        })
    }

    /// Returns the path to the WAL directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the path to the log file.
    #[must_use]
    pub fn wal_path(&self) -> PathBuf {
        self.path.join(WAL_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn open_creates_directory_and_lock() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wal");

        let wal_dir = WalDir::open(&path, true).unwrap();
        assert!(path.is_dir());
        assert!(path.join("LOCK").exists());
        assert_eq!(wal_dir.wal_path(), path.join("wal.log"));
    }

    #[test]
    fn missing_directory_without_create_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent");

        assert!(matches!(
            WalDir::open(&path, false),
            Err(WalError::StoreUnavailable { .. })
        ));
    }

    #[test]
    fn second_open_fails_locked() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wal");

        let _held = WalDir::open(&path, true).unwrap();
        assert!(matches!(WalDir::open(&path, true), Err(WalError::Locked)));
    }

    #[test]
    fn lock_released_on_drop() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wal");

        drop(WalDir::open(&path, true).unwrap());
        assert!(WalDir::open(&path, true).is_ok());
    }
}
