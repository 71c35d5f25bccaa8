//! Loggable message variants and the timestamped envelope.
//!
//! The message set is closed: exactly three kinds of consensus input pass
//! through the log, each carrying an explicit variant tag in its encoding so
//! a decoder dispatches on the bytes alone. Everything here is transient -
//! constructed, encoded, and discarded once the frame is durably appended.

use quorumwal_codec::{
    from_cbor, to_cbor, value, CodecError, CodecResult, Decode, Encode, Value,
};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Variant tag for round-state events.
const TAG_ROUND_STATE: u64 = 0x01;
/// Variant tag for peer-or-local consensus messages.
const TAG_PEER: u64 = 0x02;
/// Variant tag for timeout events.
const TAG_TIMEOUT: u64 = 0x03;

const MSG_PROPOSAL: u64 = 1;
const MSG_BLOCK_PART: u64 = 2;
const MSG_VOTE: u64 = 3;

const VOTE_PREVOTE: u64 = 1;
const VOTE_PRECOMMIT: u64 = 2;

/// A new-step notification from the consensus state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundStateEvent {
    /// Consensus height the step belongs to.
    pub height: u64,
    /// Round within the height.
    pub round: u32,
    /// Step name (e.g. `propose`, `prevote`, `precommit`).
    pub step: String,
}

/// A consensus message received from a peer or produced locally.
///
/// `peer` of `None` (or an empty identifier) marks a locally-originated
/// message, such as a vote this node produced itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerMessage {
    /// Identifier of the sending peer; absent for local messages.
    pub peer: Option<String>,
    /// The consensus message payload.
    pub msg: ConsensusMsg,
}

impl PeerMessage {
    /// Whether this message originated on the local node.
    #[must_use]
    pub fn is_local(&self) -> bool {
        self.peer.as_deref().is_none_or(str::is_empty)
    }
}

/// A fired consensus timer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeoutEvent {
    /// How long the timer ran before firing.
    pub duration: Duration,
    /// Consensus height the timer belongs to.
    pub height: u64,
    /// Round within the height.
    pub round: u32,
    /// Step the timer was armed for.
    pub step: String,
}

/// The kind of a vote message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteKind {
    /// First voting phase of a round.
    Prevote,
    /// Second voting phase of a round.
    Precommit,
}

/// The payload of a [`PeerMessage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsensusMsg {
    /// A block proposal for a round.
    Proposal {
        /// Consensus height.
        height: u64,
        /// Round within the height.
        round: u32,
        /// Serialized proposal contents.
        payload: Vec<u8>,
    },
    /// One chunk of a proposed block.
    BlockPart {
        /// Consensus height.
        height: u64,
        /// Round within the height.
        round: u32,
        /// Index of this part within the block.
        index: u32,
        /// The part's bytes.
        data: Vec<u8>,
    },
    /// A prevote or precommit.
    Vote {
        /// Consensus height.
        height: u64,
        /// Round within the height.
        round: u32,
        /// Voting phase.
        kind: VoteKind,
        /// Hash of the block voted for; empty for nil votes.
        block_hash: Vec<u8>,
    },
}

/// The closed set of loggable message kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalMessage {
    /// The state machine entered a new step.
    RoundState(RoundStateEvent),
    /// A consensus message arrived (or was produced locally).
    Peer(PeerMessage),
    /// A consensus timer fired.
    Timeout(TimeoutEvent),
}

impl WalMessage {
    /// Short variant name, for diagnostics and tooling.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RoundState(_) => "round-state",
            Self::Peer(_) => "peer",
            Self::Timeout(_) => "timeout",
        }
    }

    fn to_value(&self) -> Value {
        let (tag, body) = match self {
            Self::RoundState(ev) => (
                TAG_ROUND_STATE,
                value::map([
                    ("height", value::uint(ev.height)),
                    ("round", value::uint(u64::from(ev.round))),
                    ("step", value::text(ev.step.clone())),
                ]),
            ),
            Self::Peer(pm) => (
                TAG_PEER,
                value::map([
                    (
                        "peer",
                        match &pm.peer {
                            Some(peer) => value::text(peer.clone()),
                            None => Value::Null,
                        },
                    ),
                    ("msg", pm.msg.to_value()),
                ]),
            ),
            Self::Timeout(ti) => (
                TAG_TIMEOUT,
                value::map([
                    ("duration_ms", value::uint(ti.duration.as_millis() as u64)),
                    ("height", value::uint(ti.height)),
                    ("round", value::uint(u64::from(ti.round))),
                    ("step", value::text(ti.step.clone())),
                ]),
            ),
        };

        value::map([("type", value::uint(tag)), ("body", body)])
    }

    fn from_value(v: &Value) -> CodecResult<Self> {
        let entries = value::entries(v)?;
        let tag = value::require_u64(entries, "type")?;
        let body = value::entries(value::require_field(entries, "body")?)?;

        match tag {
            TAG_ROUND_STATE => Ok(Self::RoundState(RoundStateEvent {
                height: value::require_u64(body, "height")?,
                round: value::require_u32(body, "round")?,
                step: value::require_text(body, "step")?,
            })),
            TAG_PEER => Ok(Self::Peer(PeerMessage {
                peer: value::optional_text(body, "peer")?,
                msg: ConsensusMsg::from_value(value::require_field(body, "msg")?)?,
            })),
            TAG_TIMEOUT => Ok(Self::Timeout(TimeoutEvent {
                duration: Duration::from_millis(value::require_u64(body, "duration_ms")?),
                height: value::require_u64(body, "height")?,
                round: value::require_u32(body, "round")?,
                step: value::require_text(body, "step")?,
            })),
            tag => Err(CodecError::UnknownTag { tag }),
        }
    }
}

impl ConsensusMsg {
    fn to_value(&self) -> Value {
        let (tag, body) = match self {
            Self::Proposal {
                height,
                round,
                payload,
            } => (
                MSG_PROPOSAL,
                value::map([
                    ("height", value::uint(*height)),
                    ("round", value::uint(u64::from(*round))),
                    ("payload", value::bytes(payload.clone())),
                ]),
            ),
            Self::BlockPart {
                height,
                round,
                index,
                data,
            } => (
                MSG_BLOCK_PART,
                value::map([
                    ("height", value::uint(*height)),
                    ("round", value::uint(u64::from(*round))),
                    ("index", value::uint(u64::from(*index))),
                    ("data", value::bytes(data.clone())),
                ]),
            ),
            Self::Vote {
                height,
                round,
                kind,
                block_hash,
            } => (
                MSG_VOTE,
                value::map([
                    ("height", value::uint(*height)),
                    ("round", value::uint(u64::from(*round))),
                    (
                        "kind",
                        value::uint(match kind {
                            VoteKind::Prevote => VOTE_PREVOTE,
                            VoteKind::Precommit => VOTE_PRECOMMIT,
                        }),
                    ),
                    ("block_hash", value::bytes(block_hash.clone())),
                ]),
            ),
        };

        value::map([("type", value::uint(tag)), ("body", body)])
    }

    fn from_value(v: &Value) -> CodecResult<Self> {
        let entries = value::entries(v)?;
        let tag = value::require_u64(entries, "type")?;
        let body = value::entries(value::require_field(entries, "body")?)?;

        match tag {
            MSG_PROPOSAL => Ok(Self::Proposal {
                height: value::require_u64(body, "height")?,
                round: value::require_u32(body, "round")?,
                payload: value::require_bytes(body, "payload")?,
            }),
            MSG_BLOCK_PART => Ok(Self::BlockPart {
                height: value::require_u64(body, "height")?,
                round: value::require_u32(body, "round")?,
                index: value::require_u32(body, "index")?,
                data: value::require_bytes(body, "data")?,
            }),
            MSG_VOTE => Ok(Self::Vote {
                height: value::require_u64(body, "height")?,
                round: value::require_u32(body, "round")?,
                kind: match value::require_u64(body, "kind")? {
                    VOTE_PREVOTE => VoteKind::Prevote,
                    VOTE_PRECOMMIT => VoteKind::Precommit,
                    tag => return Err(CodecError::UnknownTag { tag }),
                },
                block_hash: value::require_bytes(body, "block_hash")?,
            }),
            tag => Err(CodecError::UnknownTag { tag }),
        }
    }
}

/// The timestamped envelope persisted for every logged event.
///
/// Constructed exactly once per event, at the moment the writer decides to
/// persist it. The timestamp is informational (debugging, log inspection)
/// and is encoded as whole milliseconds since the Unix epoch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimedMessage {
    /// Wall-clock time at which the writer accepted the message.
    pub time: SystemTime,
    /// The logged message.
    pub msg: WalMessage,
}

impl TimedMessage {
    /// Creates an envelope around a message.
    #[must_use]
    pub fn new(time: SystemTime, msg: WalMessage) -> Self {
        Self { time, msg }
    }

    fn epoch_millis(&self) -> u64 {
        self.time
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

impl Encode for TimedMessage {
    fn encode(&self) -> CodecResult<Vec<u8>> {
        to_cbor(&value::map([
            ("time", value::uint(self.epoch_millis())),
            ("msg", self.msg.to_value()),
        ]))
    }
}

impl Decode for TimedMessage {
    fn decode(bytes: &[u8]) -> CodecResult<Self> {
        let v = from_cbor(bytes)?;
        let entries = value::entries(&v)?;

        let millis = value::require_u64(entries, "time")?;
        let msg = WalMessage::from_value(value::require_field(entries, "msg")?)?;

        Ok(Self {
            time: UNIX_EPOCH + Duration::from_millis(millis),
            msg,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at_millis(ms: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_millis(ms)
    }

    fn roundtrip(msg: WalMessage) -> TimedMessage {
        let timed = TimedMessage::new(at_millis(1_700_000_000_123), msg);
        let bytes = timed.encode().unwrap();
        let decoded = TimedMessage::decode(&bytes).unwrap();
        assert_eq!(decoded, timed);
        decoded
    }

    #[test]
    fn round_state_roundtrip() {
        roundtrip(WalMessage::RoundState(RoundStateEvent {
            height: 10,
            round: 2,
            step: "prevote".into(),
        }));
    }

    #[test]
    fn peer_message_roundtrip() {
        roundtrip(WalMessage::Peer(PeerMessage {
            peer: Some("node-7".into()),
            msg: ConsensusMsg::Proposal {
                height: 5,
                round: 0,
                payload: vec![0xCA, 0xFE],
            },
        }));
    }

    #[test]
    fn local_vote_roundtrip() {
        let decoded = roundtrip(WalMessage::Peer(PeerMessage {
            peer: None,
            msg: ConsensusMsg::Vote {
                height: 8,
                round: 1,
                kind: VoteKind::Precommit,
                block_hash: vec![0xAB; 32],
            },
        }));
        match decoded.msg {
            WalMessage::Peer(pm) => assert!(pm.is_local()),
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn block_part_roundtrip() {
        roundtrip(WalMessage::Peer(PeerMessage {
            peer: Some("node-2".into()),
            msg: ConsensusMsg::BlockPart {
                height: 3,
                round: 0,
                index: 17,
                data: vec![1, 2, 3, 4],
            },
        }));
    }

    #[test]
    fn timeout_roundtrip() {
        roundtrip(WalMessage::Timeout(TimeoutEvent {
            duration: Duration::from_millis(3000),
            height: 12,
            round: 4,
            step: "propose".into(),
        }));
    }

    #[test]
    fn empty_string_peer_is_local() {
        let pm = PeerMessage {
            peer: Some(String::new()),
            msg: ConsensusMsg::Vote {
                height: 1,
                round: 0,
                kind: VoteKind::Prevote,
                block_hash: Vec::new(),
            },
        };
        assert!(pm.is_local());

        let named = PeerMessage {
            peer: Some("node-7".into()),
            ..pm
        };
        assert!(!named.is_local());
    }

    #[test]
    fn unknown_tag_fails_decode() {
        let bytes = to_cbor(&value::map([
            ("time", value::uint(0)),
            (
                "msg",
                value::map([("type", value::uint(0x7F)), ("body", value::map([]))]),
            ),
        ]))
        .unwrap();

        assert!(matches!(
            TimedMessage::decode(&bytes),
            Err(CodecError::UnknownTag { tag: 0x7F })
        ));
    }

    #[test]
    fn missing_field_fails_decode() {
        let bytes = to_cbor(&value::map([(
            "msg",
            value::map([("type", value::uint(TAG_ROUND_STATE)), ("body", value::map([]))]),
        )]))
        .unwrap();

        assert!(matches!(
            TimedMessage::decode(&bytes),
            Err(CodecError::MissingField { .. })
        ));
    }

    #[test]
    fn time_is_encoded_at_millisecond_precision() {
        let timed = TimedMessage::new(
            at_millis(1_700_000_000_123) + Duration::from_nanos(999),
            WalMessage::RoundState(RoundStateEvent {
                height: 1,
                round: 0,
                step: "propose".into(),
            }),
        );
        let decoded = TimedMessage::decode(&timed.encode().unwrap()).unwrap();
        assert_eq!(decoded.time, at_millis(1_700_000_000_123));
    }
}
