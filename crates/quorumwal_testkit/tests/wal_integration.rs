//! Cross-crate integration tests against a real file-backed store.

use proptest::prelude::*;
use quorumwal_codec::Decode;
use quorumwal_core::{TimedMessage, Wal, WalConfig, WalError};
use quorumwal_testkit::{fixtures, generators, TestWal};

#[test]
fn fresh_log_starts_with_height_zero_marker() {
    let wal = TestWal::open(false);
    assert_eq!(wal.read_payloads(), vec![b"#ENDHEIGHT: 0".to_vec()]);
}

#[test]
fn save_is_observable_by_independent_reader_on_return() {
    let wal = TestWal::open(false);
    wal.save(fixtures::round_state(1, 0));

    // A second handle on the same file sees the frame as soon as save
    // returns: there is no buffering window.
    let payloads = wal.read_payloads();
    assert_eq!(payloads.len(), 2);

    let timed = TimedMessage::decode(&payloads[1]).unwrap();
    assert_eq!(timed.msg, fixtures::round_state(1, 0));
}

#[test]
fn end_height_marker_is_the_newest_frame() {
    let wal = TestWal::open(false);
    wal.save(fixtures::round_state(5, 0));
    wal.save(fixtures::local_vote(5));
    wal.write_end_height(5);

    let payloads = wal.read_payloads();
    assert_eq!(payloads.last().unwrap(), &b"#ENDHEIGHT: 5".to_vec());
}

#[test]
fn light_mode_filters_peer_traffic_only() {
    let wal = TestWal::open(true);

    wal.save(fixtures::peer_proposal("node-7", 1));
    wal.save(fixtures::peer_block_part("node-7", 1, 0));
    assert_eq!(wal.read_payloads().len(), 1, "peer traffic must be dropped");

    wal.save(fixtures::local_vote(1));
    wal.save(fixtures::round_state(1, 1));
    wal.save(fixtures::timeout(1));
    assert_eq!(wal.read_payloads().len(), 4);
}

#[test]
fn full_mode_keeps_everything() {
    let wal = TestWal::open(false);
    for msg in fixtures::one_of_each() {
        wal.save(msg);
    }
    assert_eq!(wal.read_payloads().len(), 1 + fixtures::one_of_each().len());
}

#[test]
fn restart_does_not_rewrite_the_marker() {
    let (temp, dir) = {
        let wal = TestWal::open(false);
        wal.save(fixtures::round_state(1, 0));
        wal.write_end_height(1);
        wal.into_dir()
    };

    let reopened = Wal::open(&WalConfig::new(&dir)).unwrap();
    reopened.start().unwrap();

    // Three frames from the first run, nothing new from the restart
    let backend = quorumwal_storage::FileBackend::open(&dir.join("wal.log")).unwrap();
    let mut offset = 0;
    let mut count = 0;
    while let Some(frame) = quorumwal_core::frame::read_at(&backend, offset).unwrap() {
        offset += frame.encoded_len();
        count += 1;
    }
    assert_eq!(count, 3);

    drop(reopened);
    drop(temp);
}

#[test]
fn second_writer_on_same_directory_is_rejected() {
    let wal = TestWal::open(false);

    let result = Wal::open(&WalConfig::new(wal.dir()));
    assert!(matches!(result, Err(WalError::Locked)));
}

#[test]
fn stopped_writer_drops_everything_silently() {
    let wal = TestWal::open(false);
    wal.stop().unwrap();

    wal.save(fixtures::round_state(1, 0));
    wal.write_end_height(1);
    assert_eq!(wal.read_payloads().len(), 1);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn any_message_saved_in_full_mode_decodes_back(msg in generators::wal_message()) {
        let wal = TestWal::open(false);
        wal.save(msg.clone());

        let payloads = wal.read_payloads();
        prop_assert_eq!(payloads.len(), 2);

        let timed = TimedMessage::decode(&payloads[1]).unwrap();
        prop_assert_eq!(timed.msg, msg);
    }
}
