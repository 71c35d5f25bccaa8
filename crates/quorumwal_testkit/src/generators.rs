//! Property-based generators for WAL messages.

use proptest::prelude::*;
use quorumwal_core::{
    ConsensusMsg, PeerMessage, RoundStateEvent, TimeoutEvent, VoteKind, WalMessage,
};
use std::time::Duration;

/// Strategy for step names.
pub fn step() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("new-height".to_string()),
        Just("propose".to_string()),
        Just("prevote".to_string()),
        Just("precommit".to_string()),
        Just("commit".to_string()),
    ]
}

/// Strategy for peer identifiers, including the local cases.
pub fn peer_id() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some(String::new())),
        (0u32..100).prop_map(|n| Some(format!("node-{n}"))),
    ]
}

/// Strategy for consensus message payloads.
pub fn consensus_msg() -> impl Strategy<Value = ConsensusMsg> {
    let height = 0u64..1_000_000;
    let round = 0u32..100;
    prop_oneof![
        (
            height.clone(),
            round.clone(),
            proptest::collection::vec(any::<u8>(), 0..64)
        )
            .prop_map(|(height, round, payload)| ConsensusMsg::Proposal {
                height,
                round,
                payload,
            }),
        (
            height.clone(),
            round.clone(),
            0u32..256,
            proptest::collection::vec(any::<u8>(), 0..64)
        )
            .prop_map(|(height, round, index, data)| ConsensusMsg::BlockPart {
                height,
                round,
                index,
                data,
            }),
        (
            height,
            round,
            prop_oneof![Just(VoteKind::Prevote), Just(VoteKind::Precommit)],
            proptest::collection::vec(any::<u8>(), 0..32)
        )
            .prop_map(|(height, round, kind, block_hash)| ConsensusMsg::Vote {
                height,
                round,
                kind,
                block_hash,
            }),
    ]
}

/// Strategy for any WAL message.
pub fn wal_message() -> impl Strategy<Value = WalMessage> {
    prop_oneof![
        (0u64..1_000_000, 0u32..100, step()).prop_map(|(height, round, step)| {
            WalMessage::RoundState(RoundStateEvent {
                height,
                round,
                step,
            })
        }),
        (peer_id(), consensus_msg())
            .prop_map(|(peer, msg)| WalMessage::Peer(PeerMessage { peer, msg })),
        (0u64..60_000, 0u64..1_000_000, 0u32..100, step()).prop_map(
            |(millis, height, round, step)| {
                WalMessage::Timeout(TimeoutEvent {
                    duration: Duration::from_millis(millis),
                    height,
                    round,
                    step,
                })
            }
        ),
    ]
}
