//! Test fixtures: sample messages and temp-directory WAL helpers.

use quorumwal_core::{
    frame, ConsensusMsg, PeerMessage, RoundStateEvent, TimeoutEvent, VoteKind, Wal, WalConfig,
    WalMessage,
};
use quorumwal_storage::FileBackend;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

/// A round-state event for the given height and round.
#[must_use]
pub fn round_state(height: u64, round: u32) -> WalMessage {
    WalMessage::RoundState(RoundStateEvent {
        height,
        round,
        step: "propose".to_string(),
    })
}

/// A locally-produced prevote.
#[must_use]
pub fn local_vote(height: u64) -> WalMessage {
    WalMessage::Peer(PeerMessage {
        peer: None,
        msg: ConsensusMsg::Vote {
            height,
            round: 0,
            kind: VoteKind::Prevote,
            block_hash: vec![0xAA; 32],
        },
    })
}

/// A proposal received from `peer`.
#[must_use]
pub fn peer_proposal(peer: &str, height: u64) -> WalMessage {
    WalMessage::Peer(PeerMessage {
        peer: Some(peer.to_string()),
        msg: ConsensusMsg::Proposal {
            height,
            round: 0,
            payload: vec![0xCA, 0xFE, 0xBA, 0xBE],
        },
    })
}

/// A block part received from `peer`.
#[must_use]
pub fn peer_block_part(peer: &str, height: u64, index: u32) -> WalMessage {
    WalMessage::Peer(PeerMessage {
        peer: Some(peer.to_string()),
        msg: ConsensusMsg::BlockPart {
            height,
            round: 0,
            index,
            data: vec![1, 2, 3, 4],
        },
    })
}

/// A propose-step timeout for the given height.
#[must_use]
pub fn timeout(height: u64) -> WalMessage {
    WalMessage::Timeout(TimeoutEvent {
        duration: Duration::from_millis(3000),
        height,
        round: 0,
        step: "propose".to_string(),
    })
}

/// One message of every variant.
#[must_use]
pub fn one_of_each() -> Vec<WalMessage> {
    vec![
        round_state(1, 0),
        local_vote(1),
        peer_proposal("node-1", 1),
        timeout(1),
    ]
}

/// A started, file-backed WAL in a temporary directory.
///
/// The directory lives as long as the fixture. Dereferences to [`Wal`].
pub struct TestWal {
    wal: Wal,
    temp: TempDir,
}

impl TestWal {
    /// Opens and starts a WAL in a fresh temporary directory.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory or the WAL cannot be created.
    #[must_use]
    pub fn open(light: bool) -> Self {
        let temp = TempDir::new().expect("failed to create temp directory");
        let wal = Wal::open(&WalConfig::new(temp.path().join("wal")).light(light))
            .expect("failed to open WAL");
        wal.start().expect("failed to start WAL");
        Self { wal, temp }
    }

    /// Path of the WAL directory.
    #[must_use]
    pub fn dir(&self) -> PathBuf {
        self.temp.path().join("wal")
    }

    /// Path of the log file.
    #[must_use]
    pub fn wal_file(&self) -> PathBuf {
        self.dir().join("wal.log")
    }

    /// Reads every frame payload through an independent store handle.
    ///
    /// This observes only durably flushed data, which is exactly what a
    /// replay reader would see after a crash at this instant.
    ///
    /// # Panics
    ///
    /// Panics if the log cannot be opened or a frame fails to decode.
    #[must_use]
    pub fn read_payloads(&self) -> Vec<Vec<u8>> {
        let backend = FileBackend::open(&self.wal_file()).expect("failed to reopen log");
        let mut offset = 0;
        let mut payloads = Vec::new();
        while let Some(frame) = frame::read_at(&backend, offset).expect("frame decode failed") {
            offset += frame.encoded_len();
            payloads.push(frame.payload);
        }
        payloads
    }

    /// Stops the writer and releases the directory, returning its path for
    /// reopen scenarios. The `TempDir` guard is leaked into the return value.
    #[must_use]
    pub fn into_dir(self) -> (TempDir, PathBuf) {
        let dir = self.dir();
        self.wal.stop().expect("failed to stop WAL");
        drop(self.wal);
        (self.temp, dir)
    }
}

impl std::ops::Deref for TestWal {
    type Target = Wal;

    fn deref(&self) -> &Self::Target {
        &self.wal
    }
}
