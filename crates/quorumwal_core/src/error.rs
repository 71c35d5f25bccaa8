//! Error types for the WAL core.

use quorumwal_codec::CodecError;
use quorumwal_storage::StorageError;
use thiserror::Error;

/// Result type for WAL operations.
pub type WalResult<T> = Result<T, WalError>;

/// Errors that can occur in WAL operations.
///
/// Write failures on the hot path (`save`/`write_end_height`) are *not*
/// represented here: they are unrecoverable by design and terminate the
/// process (see the writer module).
#[derive(Debug, Error)]
pub enum WalError {
    /// The store could not be opened or sized. Recoverable: the caller may
    /// retry with backoff before starting the writer.
    #[error("store unavailable: {message}")]
    StoreUnavailable {
        /// Description of the open/size failure.
        message: String,
    },

    /// Another process holds the exclusive lock on the WAL directory.
    #[error("write-ahead log is locked by another process")]
    Locked,

    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Message codec error.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// An append wrote fewer bytes than requested.
    #[error("short write: wanted {wanted} bytes, wrote {written}")]
    ShortWrite {
        /// Bytes that should have been written.
        wanted: usize,
        /// Bytes actually written.
        written: usize,
    },

    /// A frame's recomputed checksum does not match the stored one.
    ///
    /// Reader-side: produced when decoding frames, never by the write path.
    #[error(
        "corrupt record at offset {offset}: checksum mismatch (stored {stored:08x}, computed {computed:08x})"
    )]
    CorruptRecord {
        /// Offset of the frame header in the log.
        offset: u64,
        /// Checksum stored in the frame header.
        stored: u32,
        /// Checksum recomputed over the payload.
        computed: u32,
    },

    /// The log ends before a complete frame.
    ///
    /// Reader-side: a crash mid-write leaves a trailing partial frame.
    #[error("truncated record at offset {offset}: needed {needed} bytes, {available} available")]
    TruncatedRecord {
        /// Offset of the frame header in the log.
        offset: u64,
        /// Bytes required to complete the frame.
        needed: u64,
        /// Bytes remaining in the log.
        available: u64,
    },
}

impl WalError {
    /// Creates a store unavailable error.
    pub fn store_unavailable(message: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            message: message.into(),
        }
    }
}
