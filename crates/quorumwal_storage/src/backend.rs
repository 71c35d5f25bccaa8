//! Storage backend trait definition.

use crate::error::StorageResult;

/// A low-level append-only store for WAL frames.
///
/// Backends are **opaque byte stores**. They provide simple operations for
/// appending, reading, and flushing data. The WAL core owns all format
/// interpretation - backends do not understand frames or boundary markers.
///
/// # Invariants
///
/// - `append` reports the number of bytes actually written; callers treat a
///   short count as a failed write
/// - `read_at` returns exactly the bytes previously written at that offset
/// - `flush` ensures all appended data is durable
/// - Backends must be `Send + Sync`
///
/// # Implementors
///
/// - [`super::InMemoryBackend`] - for testing
/// - [`super::FileBackend`] - for persistent storage
pub trait StorageBackend: Send + Sync {
    /// Reads `len` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The offset is beyond the current size
    /// - The read would extend beyond the current size
    /// - An I/O error occurs
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>>;

    /// Appends data to the end of the store.
    ///
    /// Returns the number of bytes written. A successful return with a count
    /// shorter than `data.len()` is possible in principle and must be treated
    /// by callers as a failed write.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs.
    fn append(&mut self, data: &[u8]) -> StorageResult<usize>;

    /// Flushes all pending writes to durable storage.
    ///
    /// After this returns successfully, all previously appended data is
    /// guaranteed to survive process termination.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush operation fails.
    fn flush(&mut self) -> StorageResult<()>;

    /// Syncs all data and metadata to durable storage.
    ///
    /// A stronger guarantee than `flush`: file metadata (size, timestamps)
    /// is durable as well.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync operation fails.
    fn sync(&mut self) -> StorageResult<()>;

    /// Returns the current size of the store in bytes.
    ///
    /// This is the offset at which the next `append` will write.
    ///
    /// # Errors
    ///
    /// Returns an error if the size cannot be determined.
    fn size(&self) -> StorageResult<u64>;

    /// Truncates the store to the given size.
    ///
    /// Removes all data after the specified offset. The WAL writer never
    /// truncates; this exists for test harnesses and future catch-up
    /// tooling.
    ///
    /// # Errors
    ///
    /// Returns an error if the truncation fails or `new_size` exceeds the
    /// current size.
    fn truncate(&mut self, new_size: u64) -> StorageResult<()>;
}
