//! # QuorumWAL Testkit
//!
//! Test utilities for QuorumWAL:
//!
//! - Crash-simulating storage backend (short writes, append/flush failures)
//! - Fixtures: sample messages and temp-directory WAL helpers
//! - Property-based generators for the message variants
//!
//! ## Usage
//!
//! ```rust
//! use quorumwal_testkit::{fixtures, TestWal};
//!
//! let wal = TestWal::open(false);
//! wal.save(fixtures::round_state(1, 0));
//! assert_eq!(wal.read_payloads().len(), 2); // height-0 marker + message
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod crash;
pub mod fixtures;
pub mod generators;

pub use crash::{CrashSwitches, CrashableBackend};
pub use fixtures::TestWal;
