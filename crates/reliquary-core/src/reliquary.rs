//! Reliquary facade
//!
//! Owns the persisted state and is its only writer:
//! - Every mutation takes the write guard, checks the caller against the
//!   injected authority, applies, and records its change event before the
//!   guard is released. Mutations therefore never interleave and readers
//!   never observe a partial write.
//! - Reads take the read guard just long enough to copy out.
//! - Verification snapshots digest and candidates, releases the guard, and
//!   only then awaits fetches.

use crate::authority::{self, Action, Authority};
use crate::error::ReliquaryError;
use crate::events::{ChangeEvent, ChangeKind, EventLog};
use crate::fetch::Fetcher;
use crate::mode::{ModeController, Rendering};
use crate::types::{DisplayMode, DisplayState, Principal, ReliquaryConfig};
use crate::verifier::{RetrievalVerifier, VerifiedArtifact, VerifierStats};
use parking_lot::RwLock;
use reliquary_artifact::{
    compress, decompress_bounded, split_chunks, ChunkStore, ContentDigest, Segment,
};
use reliquary_sources::{SourceEntry, SourceList};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, warn};

#[derive(Debug, Clone, Default)]
struct State {
    chunks: ChunkStore,
    sources: SourceList,
    expected_digest: Option<ContentDigest>,
    display: ModeController,
}

/// Persisted state layout
///
/// `expected_digest` is an empty string when unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub segments: Vec<Vec<u8>>,
    pub expected_digest: String,
    pub artist_sources: Vec<String>,
    pub collector_sources: Vec<String>,
    pub mode: DisplayMode,
    pub selected_index: usize,
}

impl StateSnapshot {
    /// Encode as JSON
    ///
    /// # Errors
    /// Returns [`ReliquaryError::Snapshot`] if encoding fails
    pub fn to_json(&self) -> Result<String, ReliquaryError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode from JSON
    ///
    /// # Errors
    /// Returns [`ReliquaryError::Snapshot`] if decoding fails
    pub fn from_json(json: &str) -> Result<Self, ReliquaryError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Preserved artifact: stored thumbnail, candidate sources, expected
/// digest and display state behind one serialization point
pub struct Reliquary {
    config: ReliquaryConfig,
    state: RwLock<State>,
    authority: Arc<dyn Authority>,
    verifier: RetrievalVerifier,
    events: EventLog,
}

impl Reliquary {
    /// Create an empty reliquary
    ///
    /// # Errors
    /// Returns [`ReliquaryError::Config`] if `config` fails validation
    pub fn new(
        config: ReliquaryConfig,
        authority: Arc<dyn Authority>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Result<Self, ReliquaryError> {
        config.validate()?;
        Ok(Self {
            verifier: RetrievalVerifier::new(fetcher, config.verifier),
            events: EventLog::new(config.events.channel_capacity, config.events.retained),
            state: RwLock::new(State::default()),
            authority,
            config,
        })
    }

    /// Rebuild from a persisted snapshot
    ///
    /// Snapshot contents are trusted as written; no events are recorded.
    ///
    /// # Errors
    /// Returns [`ReliquaryError::InvalidDigest`] for a malformed digest or
    /// [`ReliquaryError::Config`] for an invalid config
    pub fn restore(
        snapshot: StateSnapshot,
        config: ReliquaryConfig,
        authority: Arc<dyn Authority>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Result<Self, ReliquaryError> {
        let expected_digest = ContentDigest::parse_normalized(&snapshot.expected_digest)?;
        let reliquary = Self::new(config, authority, fetcher)?;
        *reliquary.state.write() = State {
            chunks: ChunkStore::from_segments(
                snapshot.segments.into_iter().map(Segment::new).collect(),
            ),
            sources: SourceList::from_parts(snapshot.artist_sources, snapshot.collector_sources),
            expected_digest,
            display: ModeController::from_state(DisplayState {
                mode: snapshot.mode,
                selected_index: snapshot.selected_index,
            }),
        };
        Ok(reliquary)
    }

    /// Copy out the persisted state
    #[must_use]
    pub fn snapshot(&self) -> StateSnapshot {
        let state = self.state.read();
        let display = state.display.state();
        StateSnapshot {
            segments: state
                .chunks
                .segments()
                .iter()
                .map(|s| s.data().to_vec())
                .collect(),
            expected_digest: state
                .expected_digest
                .map(|d| d.to_string())
                .unwrap_or_default(),
            artist_sources: state.sources.artist_sources().to_vec(),
            collector_sources: state.sources.collector_sources().to_vec(),
            mode: display.mode,
            selected_index: display.selected_index,
        }
    }

    fn mutate<T, F>(&self, caller: &Principal, action: Action, apply: F) -> Result<T, ReliquaryError>
    where
        F: FnOnce(&mut State) -> Result<(T, ChangeKind), ReliquaryError>,
    {
        let mut state = self.state.write();
        if !authority::permits(self.authority.as_ref(), caller, action) {
            warn!(principal = %caller, %action, "unauthorized mutation rejected");
            return Err(ReliquaryError::Unauthorized {
                principal: caller.clone(),
                action,
            });
        }
        let (output, change) = apply(&mut state)?;
        let event = self.events.record(caller.clone(), change);
        info!(principal = %caller, %action, event = %event.id.0, "mutation applied");
        Ok(output)
    }

    // ------------------------------------------------------------------
    // Chunk storage
    // ------------------------------------------------------------------

    /// Replace the stored segment sequence
    ///
    /// # Errors
    /// [`ReliquaryError::Unauthorized`] unless the caller is the artist
    pub fn replace_chunks(&self, caller: &Principal, chunks: Vec<Vec<u8>>) -> Result<(), ReliquaryError> {
        self.mutate(caller, Action::ReplaceChunks, |state| {
            let segments = chunks.len();
            let bytes = chunks.iter().map(Vec::len).sum();
            state.chunks.replace_all(chunks);
            Ok(((), ChangeKind::ChunksReplaced { segments, bytes }))
        })
    }

    /// Append segments after the stored sequence
    ///
    /// # Errors
    /// [`ReliquaryError::Unauthorized`] unless the caller is the artist
    pub fn append_chunks(&self, caller: &Principal, chunks: Vec<Vec<u8>>) -> Result<(), ReliquaryError> {
        self.mutate(caller, Action::AppendChunks, |state| {
            let segments = chunks.len();
            let bytes = chunks.iter().map(Vec::len).sum();
            state.chunks.append(chunks);
            Ok((
                (),
                ChangeKind::ChunksAppended {
                    segments,
                    bytes,
                    total_segments: state.chunks.len(),
                },
            ))
        })
    }

    /// Compress `image`, split it to the configured chunk size and replace
    /// the stored sequence with the result
    ///
    /// Returns the number of segments written.
    ///
    /// # Errors
    /// [`ReliquaryError::Unauthorized`] unless the caller is the artist
    pub fn store_image(&self, caller: &Principal, image: &[u8]) -> Result<usize, ReliquaryError> {
        let frame = compress(image);
        let chunks = split_chunks(&frame, self.config.store.max_chunk_size)?;
        let count = chunks.len();
        self.replace_chunks(caller, chunks)?;
        info!(
            original = image.len(),
            compressed = frame.len(),
            segments = count,
            "image stored"
        );
        Ok(count)
    }

    /// Concatenated segments
    ///
    /// # Errors
    /// [`ReliquaryError::Chunk`] (`NotFound`) before any write
    pub fn reassemble(&self) -> Result<Vec<u8>, ReliquaryError> {
        Ok(self.state.read().chunks.reassemble()?)
    }

    /// Decompressed thumbnail
    ///
    /// # Errors
    /// `NotFound` before any write, `MalformedInput` if the stored bytes
    /// are not a valid codec frame
    pub fn thumbnail(&self) -> Result<Vec<u8>, ReliquaryError> {
        let frame = self.reassemble()?;
        Ok(decompress_bounded(&frame, self.config.codec.max_decompressed_len)?)
    }

    /// True iff at least one segment is stored
    #[must_use]
    pub fn chunks_exist(&self) -> bool {
        self.state.read().chunks.exists()
    }

    /// Number of stored segments
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.state.read().chunks.len()
    }

    // ------------------------------------------------------------------
    // Expected digest
    // ------------------------------------------------------------------

    /// Set the expected digest from hex; empty clears it
    ///
    /// # Errors
    /// [`ReliquaryError::Unauthorized`] unless the caller is the artist,
    /// [`ReliquaryError::InvalidDigest`] for malformed hex
    pub fn set_expected_digest(
        &self,
        caller: &Principal,
        hex: &str,
    ) -> Result<Option<ContentDigest>, ReliquaryError> {
        self.mutate(caller, Action::SetDigest, |state| {
            let digest = ContentDigest::parse_normalized(hex)?;
            state.expected_digest = digest;
            Ok((digest, ChangeKind::DigestUpdated { digest }))
        })
    }

    /// Current expected digest
    #[must_use]
    pub fn expected_digest(&self) -> Option<ContentDigest> {
        self.state.read().expected_digest
    }

    // ------------------------------------------------------------------
    // Sources
    // ------------------------------------------------------------------

    /// Append an artist source
    ///
    /// # Errors
    /// `Unauthorized`, `EmptyIdentifier` or `DuplicateIdentifier`
    pub fn add_artist_source(&self, caller: &Principal, uri: impl Into<String>) -> Result<(), ReliquaryError> {
        let uri = uri.into();
        self.mutate(caller, Action::AddArtistSource, |state| {
            let change = state.sources.add_artist_source(uri)?;
            Ok(((), ChangeKind::Source { change }))
        })
    }

    /// Append a collector source
    ///
    /// # Errors
    /// `Unauthorized`, `EmptyIdentifier` or `DuplicateIdentifier`
    pub fn add_collector_source(
        &self,
        caller: &Principal,
        uri: impl Into<String>,
    ) -> Result<(), ReliquaryError> {
        let uri = uri.into();
        self.mutate(caller, Action::AddCollectorSource, |state| {
            let change = state.sources.add_collector_source(uri)?;
            Ok(((), ChangeKind::Source { change }))
        })
    }

    /// Swap-remove a collector source, returning its URI
    ///
    /// # Errors
    /// `Unauthorized` or `IndexOutOfRange`
    pub fn remove_collector_source(&self, caller: &Principal, index: usize) -> Result<String, ReliquaryError> {
        self.mutate(caller, Action::RemoveCollectorSource, |state| {
            let change = state.sources.remove_collector_source(index)?;
            let uri = change.uri().unwrap_or_default().to_owned();
            Ok((uri, ChangeKind::Source { change }))
        })
    }

    /// Replace the artist partition verbatim
    ///
    /// # Errors
    /// [`ReliquaryError::Unauthorized`] unless the caller is the artist
    pub fn replace_artist_sources(&self, caller: &Principal, sources: Vec<String>) -> Result<(), ReliquaryError> {
        self.mutate(caller, Action::ReplaceArtistSources, |state| {
            let change = state.sources.replace_artist_sources(sources);
            Ok(((), ChangeKind::Source { change }))
        })
    }

    /// Artist partition then collector partition
    #[must_use]
    pub fn combined_ordered(&self) -> Vec<SourceEntry> {
        self.state.read().sources.combined_ordered()
    }

    /// Artist partition
    #[must_use]
    pub fn artist_sources(&self) -> Vec<String> {
        self.state.read().sources.artist_sources().to_vec()
    }

    /// Collector partition in its current order
    #[must_use]
    pub fn collector_sources(&self) -> Vec<String> {
        self.state.read().sources.collector_sources().to_vec()
    }

    // ------------------------------------------------------------------
    // Display
    // ------------------------------------------------------------------

    /// Set the display mode
    ///
    /// # Errors
    /// `Unauthorized` unless the caller is the artist or current holder
    pub fn set_mode(&self, caller: &Principal, mode: DisplayMode) -> Result<(), ReliquaryError> {
        self.mutate(caller, Action::SetMode, |state| {
            let from = state.display.set_mode(mode);
            Ok(((), ChangeKind::ModeChanged { from, to: mode }))
        })
    }

    /// Set the direct-mode selection; allowed in either mode
    ///
    /// # Errors
    /// `Unauthorized` unless the caller is the artist or current holder
    pub fn select_source(&self, caller: &Principal, index: usize) -> Result<(), ReliquaryError> {
        self.mutate(caller, Action::SetSelection, |state| {
            let from = state.display.select(index);
            Ok(((), ChangeKind::SelectionChanged { from, to: index }))
        })
    }

    /// Current mode and selection
    #[must_use]
    pub fn display_state(&self) -> DisplayState {
        self.state.read().display.state()
    }

    /// The artist source direct mode would show
    ///
    /// # Errors
    /// [`ReliquaryError::InvalidSelection`] if the selection is out of range
    pub fn direct_output(&self) -> Result<String, ReliquaryError> {
        let state = self.state.read();
        state
            .display
            .direct_output(state.sources.artist_sources())
            .map(ToString::to_string)
    }

    /// Run the retrieval verifier over the current candidates
    ///
    /// # Errors
    /// [`ReliquaryError::NoVerifiedSourceAvailable`] with the reason
    pub async fn verify(&self) -> Result<VerifiedArtifact, ReliquaryError> {
        let (expected, candidates) = {
            let state = self.state.read();
            (state.expected_digest, state.sources.combined_ordered())
        };
        self.verifier.verify(expected, &candidates).await
    }

    /// Output for the current mode
    ///
    /// # Errors
    /// `InvalidSelection` in direct mode, `NoVerifiedSourceAvailable` in
    /// verified mode
    pub async fn render(&self) -> Result<Rendering, ReliquaryError> {
        let mode = self.state.read().display.mode();
        match mode {
            DisplayMode::Direct => self.direct_output().map(|uri| Rendering::Direct { uri }),
            DisplayMode::Verified => self.verify().await.map(Rendering::Verified),
        }
    }

    // ------------------------------------------------------------------
    // Observability
    // ------------------------------------------------------------------

    /// Retained change events in record order
    #[must_use]
    pub fn events(&self) -> Vec<ChangeEvent> {
        self.events.events()
    }

    /// Events recorded since creation, including those past retention
    #[must_use]
    pub fn events_recorded(&self) -> u64 {
        self.events.total_recorded()
    }

    /// Receive change events recorded from now on
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.events.subscribe()
    }

    /// Verifier counters
    #[must_use]
    pub fn verifier_stats(&self) -> VerifierStats {
        self.verifier.stats()
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ReliquaryConfig {
        &self.config
    }
}

impl std::fmt::Debug for Reliquary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reliquary")
            .field("config", &self.config)
            .field("state", &*self.state.read())
            .field("verifier", &self.verifier)
            .finish_non_exhaustive()
    }
}
