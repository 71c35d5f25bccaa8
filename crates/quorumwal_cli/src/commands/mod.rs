//! CLI command implementations.

pub mod inspect;
pub mod verify;

use std::path::{Path, PathBuf};

/// Resolves a user-supplied path to the log file: a directory resolves to
/// the `wal.log` inside it, anything else is used as-is.
pub fn resolve_wal_file(path: &Path) -> PathBuf {
    if path.is_dir() {
        path.join("wal.log")
    } else {
        path.to_path_buf()
    }
}
