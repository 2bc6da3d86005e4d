//! Functional tests for the single serialization point.
//!
//! Core guarantees exercised here:
//! - Concurrent mutations are applied one at a time; none is lost.
//! - Every accepted mutation produces exactly one event, in apply order.
//! - Stored chunks survive a snapshot round trip byte-for-byte.

use pretty_assertions::assert_eq;
use reliquary_core::{ChangeKind, DisplayMode, ReliquaryConfig, Reliquary, StateSnapshot};
use reliquary_sources::{Role, SourceChange};
use reliquary_test_utils::{
    artist, digest_hex, holder, setup_reliquary, setup_reliquary_with, FixedAuthority,
    StaticFetcher,
};
use std::collections::HashSet;
use std::sync::Arc;

/// Tenet: concurrent writers never lose an update.
#[test]
fn concurrent_adds_all_land() {
    let (reliquary, _, _) = setup_reliquary(StaticFetcher::new());

    std::thread::scope(|scope| {
        for worker in 0..8 {
            let reliquary = &reliquary;
            scope.spawn(move || {
                for i in 0..25 {
                    reliquary
                        .add_collector_source(&holder(), format!("ipfs://{worker}/{i}"))
                        .unwrap();
                }
            });
        }
    });

    let sources = reliquary.collector_sources();
    assert_eq!(sources.len(), 200);
    assert_eq!(sources.iter().collect::<HashSet<_>>().len(), 200);
    assert_eq!(reliquary.events().len(), 200);
}

/// Tenet: event order matches the order the state observed.
#[test]
fn events_follow_apply_order() {
    let (reliquary, _, _) = setup_reliquary(StaticFetcher::new());

    std::thread::scope(|scope| {
        for worker in 0..4 {
            let reliquary = &reliquary;
            scope.spawn(move || {
                for i in 0..10 {
                    reliquary
                        .add_collector_source(&holder(), format!("{worker}-{i}"))
                        .unwrap();
                }
            });
        }
    });

    let from_events: Vec<String> = reliquary
        .events()
        .into_iter()
        .filter_map(|event| match event.change {
            ChangeKind::Source {
                change: SourceChange::Added { uri, .. },
            } => Some(uri),
            _ => None,
        })
        .collect();
    assert_eq!(from_events, reliquary.collector_sources());
}

#[test]
fn each_mutation_records_its_change() {
    let (reliquary, _, _) = setup_reliquary(StaticFetcher::new());

    reliquary.add_artist_source(&artist(), "A").unwrap();
    reliquary.add_collector_source(&holder(), "C1").unwrap();
    reliquary.add_collector_source(&holder(), "C2").unwrap();
    reliquary.remove_collector_source(&holder(), 0).unwrap();
    reliquary.set_mode(&holder(), DisplayMode::Verified).unwrap();
    reliquary.select_source(&artist(), 1).unwrap();
    reliquary.set_expected_digest(&artist(), "").unwrap();

    let events = reliquary.events();
    let kinds: Vec<ChangeKind> = events.iter().map(|e| e.change.clone()).collect();
    assert_eq!(
        kinds[3],
        ChangeKind::Source {
            change: SourceChange::Removed {
                uri: "C1".into(),
                role: Role::Collector,
                removal: reliquary_sources::Removal::SwapRemove {
                    index: 0,
                    moved_from: Some(1),
                },
            },
        }
    );
    assert_eq!(
        kinds[4],
        ChangeKind::ModeChanged {
            from: DisplayMode::Direct,
            to: DisplayMode::Verified,
        }
    );
    assert_eq!(kinds[5], ChangeKind::SelectionChanged { from: 0, to: 1 });
    assert_eq!(kinds[6], ChangeKind::DigestUpdated { digest: None });
    assert_eq!(events[0].actor, artist());
    assert_eq!(events[1].actor, holder());
}

/// Tenet: the in-memory log is bounded; subscribers still see everything.
#[tokio::test]
async fn event_log_keeps_only_latest() {
    let config = ReliquaryConfig::new().with_event_retention(2);
    let (reliquary, _, _) = setup_reliquary_with(config, StaticFetcher::new());
    let mut rx = reliquary.subscribe();

    for index in 0..5 {
        reliquary.select_source(&holder(), index).unwrap();
    }

    let kept: Vec<ChangeKind> = reliquary.events().into_iter().map(|e| e.change).collect();
    assert_eq!(
        kept,
        vec![
            ChangeKind::SelectionChanged { from: 2, to: 3 },
            ChangeKind::SelectionChanged { from: 3, to: 4 },
        ]
    );
    assert_eq!(reliquary.events_recorded(), 5);
    for _ in 0..5 {
        assert!(rx.recv().await.is_ok());
    }
}

#[tokio::test]
async fn subscribers_receive_live_events() {
    let (reliquary, _, _) = setup_reliquary(StaticFetcher::new());
    let mut rx = reliquary.subscribe();

    reliquary.replace_chunks(&artist(), vec![b"AB".to_vec(), b"C".to_vec()]).unwrap();
    reliquary.append_chunks(&artist(), vec![b"DE".to_vec()]).unwrap();

    assert_eq!(
        rx.recv().await.unwrap().change,
        ChangeKind::ChunksReplaced {
            segments: 2,
            bytes: 3
        }
    );
    assert_eq!(
        rx.recv().await.unwrap().change,
        ChangeKind::ChunksAppended {
            segments: 1,
            bytes: 2,
            total_segments: 3
        }
    );
}

/// Tenet: ABCDE stored in two-byte chunks reassembles exactly.
#[test]
fn chunked_thumbnail_round_trip() {
    let config = ReliquaryConfig::new().with_max_chunk_size(2);
    let (reliquary, _, _) = setup_reliquary_with(config, StaticFetcher::new());

    reliquary
        .replace_chunks(&artist(), vec![b"AB".to_vec(), b"CD".to_vec(), b"E".to_vec()])
        .unwrap();
    assert_eq!(reliquary.reassemble().unwrap(), b"ABCDE");
    assert_eq!(reliquary.segment_count(), 3);

    let segments = reliquary.store_image(&artist(), b"ABCDE").unwrap();
    assert_eq!(reliquary.segment_count(), segments);
    assert_eq!(reliquary.thumbnail().unwrap(), b"ABCDE");
}

#[test]
fn corrupted_chunks_surface_malformed_input() {
    let (reliquary, _, _) = setup_reliquary(StaticFetcher::new());
    reliquary.replace_chunks(&artist(), vec![vec![0xff; 3]]).unwrap();
    assert!(matches!(
        reliquary.thumbnail(),
        Err(reliquary_core::ReliquaryError::Codec(_))
    ));
}

#[test]
fn snapshot_survives_json_round_trip() {
    let (reliquary, _, _) = setup_reliquary(StaticFetcher::new());
    reliquary.store_image(&artist(), &[7u8; 1000]).unwrap();
    reliquary
        .set_expected_digest(&artist(), &digest_hex(b"full"))
        .unwrap();
    reliquary
        .replace_artist_sources(&artist(), vec!["A".into(), "A".into()])
        .unwrap();
    reliquary.add_collector_source(&holder(), "C").unwrap();
    reliquary.select_source(&holder(), 1).unwrap();

    let snapshot = reliquary.snapshot();
    assert_eq!(snapshot.expected_digest, digest_hex(b"full"));

    let json = snapshot.to_json().unwrap();
    let restored = Reliquary::restore(
        StateSnapshot::from_json(&json).unwrap(),
        ReliquaryConfig::new(),
        Arc::new(FixedAuthority::default()),
        Arc::new(StaticFetcher::new()),
    )
    .unwrap();

    assert_eq!(restored.snapshot(), snapshot);
    assert_eq!(restored.thumbnail().unwrap(), vec![7u8; 1000]);
    assert_eq!(restored.direct_output().unwrap(), "A");
}

#[test]
fn restore_rejects_malformed_digest() {
    let snapshot = StateSnapshot {
        expected_digest: "not hex".into(),
        ..StateSnapshot::default()
    };
    let result = Reliquary::restore(
        snapshot,
        ReliquaryConfig::new(),
        Arc::new(FixedAuthority::default()),
        Arc::new(StaticFetcher::new()),
    );
    assert!(matches!(
        result,
        Err(reliquary_core::ReliquaryError::InvalidDigest(_))
    ));
}
