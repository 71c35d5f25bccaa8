//! Crash simulation for the write path.
//!
//! [`CrashableBackend`] wraps any [`StorageBackend`] and injects the failure
//! modes the writer must treat as fatal: append errors, short writes, and
//! flush errors. The switches are shared through an [`std::sync::Arc`] so
//! tests keep control after the backend has been moved into a writer.

use quorumwal_storage::{StorageBackend, StorageResult};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

fn injected(kind: &str) -> std::io::Error {
    std::io::Error::other(format!("injected {kind} failure"))
}

/// Failure switches shared between a test and its [`CrashableBackend`].
#[derive(Debug)]
pub struct CrashSwitches {
    /// Total bytes the backend will still write; appends beyond this are
    /// cut short. `usize::MAX` disables the budget.
    short_write_budget: AtomicUsize,
    fail_appends: AtomicBool,
    fail_flushes: AtomicBool,
}

impl Default for CrashSwitches {
    fn default() -> Self {
        Self {
            short_write_budget: AtomicUsize::new(usize::MAX),
            fail_appends: AtomicBool::new(false),
            fail_flushes: AtomicBool::new(false),
        }
    }
}

impl CrashSwitches {
    /// Makes every subsequent append fail with an I/O error.
    pub fn fail_appends(&self, on: bool) {
        self.fail_appends.store(on, Ordering::SeqCst);
    }

    /// Makes every subsequent flush fail with an I/O error.
    pub fn fail_flushes(&self, on: bool) {
        self.fail_flushes.store(on, Ordering::SeqCst);
    }

    /// Allows `bytes` more bytes to be written, then cuts appends short
    /// (simulating a torn write, e.g. a full disk).
    pub fn short_write_after(&self, bytes: usize) {
        self.short_write_budget.store(bytes, Ordering::SeqCst);
    }
}

/// A storage backend wrapper that can simulate crashes mid-write.
pub struct CrashableBackend {
    inner: Box<dyn StorageBackend>,
    switches: Arc<CrashSwitches>,
}

impl CrashableBackend {
    /// Wraps an inner backend.
    #[must_use]
    pub fn new(inner: Box<dyn StorageBackend>) -> Self {
        Self {
            inner,
            switches: Arc::new(CrashSwitches::default()),
        }
    }

    /// Returns a handle to the failure switches.
    #[must_use]
    pub fn switches(&self) -> Arc<CrashSwitches> {
        Arc::clone(&self.switches)
    }
}

impl StorageBackend for CrashableBackend {
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        self.inner.read_at(offset, len)
    }

    fn append(&mut self, data: &[u8]) -> StorageResult<usize> {
        if self.switches.fail_appends.load(Ordering::SeqCst) {
            return Err(injected("append").into());
        }

        let budget = self.switches.short_write_budget.load(Ordering::SeqCst);
        if budget < data.len() {
            self.inner.append(&data[..budget])?;
            self.switches.short_write_budget.store(0, Ordering::SeqCst);
            return Ok(budget);
        }

        let written = self.inner.append(data)?;
        if budget != usize::MAX {
            self.switches
                .short_write_budget
                .store(budget - written, Ordering::SeqCst);
        }
        Ok(written)
    }

    fn flush(&mut self) -> StorageResult<()> {
        if self.switches.fail_flushes.load(Ordering::SeqCst) {
            return Err(injected("flush").into());
        }
        self.inner.flush()
    }

    fn sync(&mut self) -> StorageResult<()> {
        self.inner.sync()
    }

    fn size(&self) -> StorageResult<u64> {
        self.inner.size()
    }

    fn truncate(&mut self, new_size: u64) -> StorageResult<()> {
        self.inner.truncate(new_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use quorumwal_core::Wal;
    use quorumwal_storage::InMemoryBackend;

    fn crashable_wal() -> (Wal, Arc<CrashSwitches>) {
        let backend = CrashableBackend::new(Box::new(InMemoryBackend::new()));
        let switches = backend.switches();
        let wal = Wal::new(Box::new(backend), false);
        wal.start().unwrap();
        (wal, switches)
    }

    #[test]
    #[should_panic(expected = "unrecoverable write-ahead log failure")]
    fn append_failure_is_fatal() {
        let (wal, switches) = crashable_wal();
        switches.fail_appends(true);
        wal.save(fixtures::round_state(1, 0));
    }

    #[test]
    #[should_panic(expected = "unrecoverable write-ahead log failure")]
    fn short_write_is_fatal() {
        let (wal, switches) = crashable_wal();
        switches.short_write_after(4);
        wal.save(fixtures::round_state(1, 0));
    }

    #[test]
    #[should_panic(expected = "unrecoverable write-ahead log failure")]
    fn flush_failure_is_fatal() {
        let (wal, switches) = crashable_wal();
        switches.fail_flushes(true);
        wal.save(fixtures::round_state(1, 0));
    }

    #[test]
    #[should_panic(expected = "boundary marker")]
    fn marker_write_failure_is_fatal() {
        let (wal, switches) = crashable_wal();
        switches.fail_appends(true);
        wal.write_end_height(1);
    }

    #[test]
    fn start_failure_is_an_ordinary_error() {
        let backend = CrashableBackend::new(Box::new(InMemoryBackend::new()));
        let switches = backend.switches();
        switches.fail_appends(true);

        let wal = Wal::new(Box::new(backend), false);
        assert!(wal.start().is_err());
    }

    #[test]
    fn switches_off_means_transparent() {
        let (wal, _switches) = crashable_wal();
        wal.save(fixtures::round_state(1, 0));
        assert!(wal.size().unwrap() > 0);
    }
}
