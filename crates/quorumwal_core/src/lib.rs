//! # QuorumWAL Core
//!
//! Crash-safe, append-only write-ahead log for the internal messages of a
//! consensus state machine. Every state transition, received peer message,
//! and timeout event is persisted before (or as part of) being processed, so
//! that after a crash the engine can be driven through the exact same inputs
//! and arrive deterministically at the same state.
//!
//! ## On-disk format
//!
//! A sequence of frames, concatenated with no padding:
//!
//! ```text
//! | crc32c (4, big-endian) | length (4, big-endian) | payload (length) |
//! ```
//!
//! Payloads are either CBOR-encoded [`message::TimedMessage`] envelopes or
//! literal `#ENDHEIGHT: <N>` boundary markers. A fresh log always begins
//! with the height-0 marker.
//!
//! ## Reader contract
//!
//! This crate owns the write path only. A replay reader walking the log must
//! honor:
//!
//! - **Checksum mismatch** means corruption at that offset; the record must
//!   be rejected.
//! - **A trailing partial frame** is the signature of a crash mid-write; the
//!   log is intact up to it.
//! - The last `#ENDHEIGHT` marker names the height the log reflects: replay
//!   resumes from there.
//!
//! ## Durability
//!
//! `save` and `write_end_height` flush after every write and do not return
//! until the frame is durable. Write failures past start are unrecoverable
//! and terminate the process - see [`writer`].

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod dir;
pub mod error;
pub mod frame;
pub mod marker;
pub mod message;
pub mod writer;

pub use config::WalConfig;
pub use error::{WalError, WalResult};
pub use frame::Frame;
pub use message::{
    ConsensusMsg, PeerMessage, RoundStateEvent, TimedMessage, TimeoutEvent, VoteKind, WalMessage,
};
pub use writer::{NopWal, Wal, WalWriter};
