//! Frame codec: integrity-checked, length-delimited records.
//!
//! Every record in the log - enveloped messages and boundary markers alike -
//! is wrapped in a frame:
//!
//! ```text
//! | crc32c (4, big-endian) | length (4, big-endian) | payload (length) |
//! ```
//!
//! Frames are concatenated with no padding. The checksum covers the payload
//! only, so a reader can discriminate between a corrupt record (checksum
//! mismatch) and a truncated one (log ends mid-frame, the signature of a
//! crash during a write).

use crate::error::{WalError, WalResult};
use quorumwal_storage::StorageBackend;

/// Size of the frame header in bytes: 4-byte CRC32C + 4-byte length.
pub const HEADER_SIZE: usize = 8;

/// Computes the CRC32C (Castagnoli) checksum of `data`.
#[must_use]
pub fn crc32c(data: &[u8]) -> u32 {
    const CRC32C_TABLE: [u32; 256] = {
        let mut table = [0u32; 256];
        let mut i = 0;
        while i < 256 {
            let mut crc = i as u32;
            let mut j = 0;
            while j < 8 {
                if crc & 1 != 0 {
                    crc = (crc >> 1) ^ 0x82F6_3B78;
                } else {
                    crc >>= 1;
                }
                j += 1;
            }
            table[i] = crc;
            i += 1;
        }
        table
    };

    let mut crc = 0xFFFF_FFFF_u32;
    for &byte in data {
        let index = ((crc ^ u32::from(byte)) & 0xFF) as usize;
        crc = (crc >> 8) ^ CRC32C_TABLE[index];
    }
    !crc
}

/// A decoded frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// The stored (and verified) payload checksum.
    pub checksum: u32,
    /// The payload bytes.
    pub payload: Vec<u8>,
}

impl Frame {
    /// Total encoded size of this frame, header included.
    #[must_use]
    pub fn encoded_len(&self) -> u64 {
        (HEADER_SIZE + self.payload.len()) as u64
    }
}

/// Encodes a payload into a frame.
///
/// Pure and infallible for any payload shorter than 2^32 bytes; larger
/// payloads violate the caller contract (consensus messages are orders of
/// magnitude smaller).
#[must_use]
pub fn encode(payload: &[u8]) -> Vec<u8> {
    debug_assert!(payload.len() <= u32::MAX as usize);

    let crc = crc32c(payload);
    let length = payload.len() as u32;

    let mut bytes = Vec::with_capacity(HEADER_SIZE + payload.len());
    bytes.extend_from_slice(&crc.to_be_bytes());
    bytes.extend_from_slice(&length.to_be_bytes());
    bytes.extend_from_slice(payload);
    bytes
}

/// Decodes one frame from the start of `buf`.
///
/// Returns the frame and the number of bytes consumed; `buf` may contain
/// further frames after the consumed prefix. Error offsets are relative to
/// the start of `buf`.
///
/// # Errors
///
/// - [`WalError::TruncatedRecord`] if `buf` ends before the header or the
///   stated payload length
/// - [`WalError::CorruptRecord`] if the recomputed CRC32C mismatches
pub fn decode(buf: &[u8]) -> WalResult<(Frame, usize)> {
    decode_inner(buf, 0)
}

/// Reads the frame starting at `offset` in the backend.
///
/// Returns `Ok(None)` at exact end-of-log.
///
/// # Errors
///
/// Same contract as [`decode`], with offsets absolute in the log, plus any
/// storage error surfaced by the backend.
pub fn read_at(backend: &dyn StorageBackend, offset: u64) -> WalResult<Option<Frame>> {
    let size = backend.size()?;
    if offset == size {
        return Ok(None);
    }

    let available = size.saturating_sub(offset);
    if available < HEADER_SIZE as u64 {
        return Err(WalError::TruncatedRecord {
            offset,
            needed: HEADER_SIZE as u64,
            available,
        });
    }

    let header = backend.read_at(offset, HEADER_SIZE)?;
    let stored = u32::from_be_bytes([header[0], header[1], header[2], header[3]]);
    let length = u32::from_be_bytes([header[4], header[5], header[6], header[7]]) as u64;

    let needed = HEADER_SIZE as u64 + length;
    if available < needed {
        return Err(WalError::TruncatedRecord {
            offset,
            needed,
            available,
        });
    }

    let payload = backend.read_at(offset + HEADER_SIZE as u64, length as usize)?;
    let computed = crc32c(&payload);
    if stored != computed {
        return Err(WalError::CorruptRecord {
            offset,
            stored,
            computed,
        });
    }

    Ok(Some(Frame {
        checksum: stored,
        payload,
    }))
}

fn decode_inner(buf: &[u8], offset: u64) -> WalResult<(Frame, usize)> {
    if buf.len() < HEADER_SIZE {
        return Err(WalError::TruncatedRecord {
            offset,
            needed: HEADER_SIZE as u64,
            available: buf.len() as u64,
        });
    }

    let stored = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]);
    let length = u32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]) as usize;

    let total = HEADER_SIZE + length;
    if buf.len() < total {
        return Err(WalError::TruncatedRecord {
            offset,
            needed: total as u64,
            available: buf.len() as u64,
        });
    }

    let payload = buf[HEADER_SIZE..total].to_vec();
    let computed = crc32c(&payload);
    if stored != computed {
        return Err(WalError::CorruptRecord {
            offset,
            stored,
            computed,
        });
    }

    Ok((
        Frame {
            checksum: stored,
            payload,
        },
        total,
    ))
}
