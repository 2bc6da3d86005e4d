//! Functional tests for the capability checks on every mutation.
//!
//! Core guarantees exercised here:
//! - Thumbnail, digest and artist sources are artist-only.
//! - Collector sources and display state accept the artist or the current
//!   holder, and follow the holder across transfers.
//! - A rejected call leaves state and the event log untouched.

use reliquary_core::{Action, DisplayMode, ReliquaryError};
use reliquary_test_utils::{artist, digest_hex, holder, setup_reliquary, stranger, StaticFetcher};

fn assert_unauthorized(result: Result<impl std::fmt::Debug, ReliquaryError>, expected: Action) {
    match result {
        Err(ReliquaryError::Unauthorized { action, .. }) => assert_eq!(action, expected),
        other => panic!("expected unauthorized {expected}, got {other:?}"),
    }
}

/// Tenet: only the artist writes artist-owned state.
#[test]
fn artist_only_actions_reject_others() {
    let (reliquary, _, _) = setup_reliquary(StaticFetcher::new());

    for caller in [holder(), stranger()] {
        assert_unauthorized(
            reliquary.replace_chunks(&caller, vec![b"x".to_vec()]),
            Action::ReplaceChunks,
        );
        assert_unauthorized(
            reliquary.append_chunks(&caller, vec![b"x".to_vec()]),
            Action::AppendChunks,
        );
        assert_unauthorized(
            reliquary.set_expected_digest(&caller, &digest_hex(b"x")),
            Action::SetDigest,
        );
        assert_unauthorized(reliquary.add_artist_source(&caller, "A"), Action::AddArtistSource);
        assert_unauthorized(
            reliquary.replace_artist_sources(&caller, vec!["A".into()]),
            Action::ReplaceArtistSources,
        );
    }

    assert!(!reliquary.chunks_exist());
    assert!(reliquary.expected_digest().is_none());
    assert!(reliquary.artist_sources().is_empty());
    assert!(reliquary.events().is_empty());
}

#[test]
fn stranger_cannot_touch_shared_state() {
    let (reliquary, _, _) = setup_reliquary(StaticFetcher::new());
    reliquary.add_collector_source(&holder(), "C").unwrap();

    assert_unauthorized(
        reliquary.add_collector_source(&stranger(), "D"),
        Action::AddCollectorSource,
    );
    assert_unauthorized(
        reliquary.remove_collector_source(&stranger(), 0),
        Action::RemoveCollectorSource,
    );
    assert_unauthorized(
        reliquary.set_mode(&stranger(), DisplayMode::Verified),
        Action::SetMode,
    );
    assert_unauthorized(reliquary.select_source(&stranger(), 1), Action::SetSelection);

    assert_eq!(reliquary.collector_sources(), vec!["C"]);
    assert_eq!(reliquary.display_state().mode, DisplayMode::Direct);
    assert_eq!(reliquary.events().len(), 1);
}

#[test]
fn artist_may_manage_shared_state() {
    let (reliquary, _, _) = setup_reliquary(StaticFetcher::new());
    reliquary.add_collector_source(&artist(), "C").unwrap();
    reliquary.set_mode(&artist(), DisplayMode::Verified).unwrap();
    reliquary.select_source(&artist(), 2).unwrap();
    assert_eq!(reliquary.remove_collector_source(&artist(), 0).unwrap(), "C");
}

/// Tenet: the holder capability moves with the artifact.
#[test]
fn holder_rights_follow_transfer() {
    let (reliquary, authority, _) = setup_reliquary(StaticFetcher::new());
    reliquary.add_collector_source(&holder(), "C").unwrap();

    authority.transfer(stranger());

    assert_unauthorized(
        reliquary.add_collector_source(&holder(), "D"),
        Action::AddCollectorSource,
    );
    reliquary.add_collector_source(&stranger(), "D").unwrap();
    assert_eq!(reliquary.collector_sources(), vec!["C", "D"]);
}

/// Tenet: validation failures from authorized callers change nothing.
#[test]
fn rejected_validation_records_nothing() {
    let (reliquary, _, _) = setup_reliquary(StaticFetcher::new());
    reliquary.add_artist_source(&artist(), "A").unwrap();

    assert!(matches!(
        reliquary.add_artist_source(&artist(), ""),
        Err(ReliquaryError::Source(_))
    ));
    assert!(matches!(
        reliquary.add_artist_source(&artist(), "A"),
        Err(ReliquaryError::Source(_))
    ));
    assert!(matches!(
        reliquary.remove_collector_source(&holder(), 0),
        Err(ReliquaryError::Source(_))
    ));
    assert!(matches!(
        reliquary.set_expected_digest(&artist(), "abc"),
        Err(ReliquaryError::InvalidDigest(_))
    ));

    assert_eq!(reliquary.artist_sources(), vec!["A"]);
    assert_eq!(reliquary.events().len(), 1);
}
