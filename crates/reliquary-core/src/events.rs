//! Change events
//!
//! Every accepted mutation is recorded once in a bounded [`EventLog`]
//! and published to live subscribers.

use crate::types::{DisplayMode, Principal};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use reliquary_artifact::ContentDigest;
use reliquary_sources::SourceChange;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tokio::sync::broadcast;
use ulid::Ulid;

/// Unique event identifier (ULID for sortability)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventId(pub Ulid);

impl EventId {
    /// Generate new event ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

/// What changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChangeKind {
    /// Source list mutation
    Source { change: SourceChange },
    /// Expected digest set or cleared
    DigestUpdated { digest: Option<ContentDigest> },
    /// Display mode set (possibly to the same value)
    ModeChanged { from: DisplayMode, to: DisplayMode },
    /// Direct-mode selection set
    SelectionChanged { from: usize, to: usize },
    /// Segment sequence replaced
    ChunksReplaced { segments: usize, bytes: usize },
    /// Segments appended
    ChunksAppended {
        segments: usize,
        bytes: usize,
        total_segments: usize,
    },
}

/// A recorded change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub id: EventId,
    pub at: DateTime<Utc>,
    pub actor: Principal,
    pub change: ChangeKind,
}

/// Bounded change log with live fan-out
///
/// Keeps the most recent `retained` events; older ones are dropped and
/// remain visible only to subscribers that were listening at the time.
#[derive(Debug)]
pub struct EventLog {
    inner: Mutex<Retained>,
    sender: broadcast::Sender<ChangeEvent>,
}

#[derive(Debug)]
struct Retained {
    events: VecDeque<ChangeEvent>,
    limit: usize,
    recorded: u64,
}

impl EventLog {
    /// Create log; each subscriber buffers up to `capacity` events and the
    /// log keeps the latest `retained`
    #[must_use]
    pub fn new(capacity: usize, retained: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        let limit = retained.max(1);
        Self {
            inner: Mutex::new(Retained {
                events: VecDeque::with_capacity(limit.min(64)),
                limit,
                recorded: 0,
            }),
            sender,
        }
    }

    /// Record a change and publish it
    pub fn record(&self, actor: Principal, change: ChangeKind) -> ChangeEvent {
        let event = ChangeEvent {
            id: EventId::new(),
            at: Utc::now(),
            actor,
            change,
        };
        {
            let mut inner = self.inner.lock();
            if inner.events.len() == inner.limit {
                inner.events.pop_front();
            }
            inner.events.push_back(event.clone());
            inner.recorded += 1;
        }
        // No subscribers is not an error
        let _ = self.sender.send(event.clone());
        event
    }

    /// Retained events, oldest first
    #[must_use]
    pub fn events(&self) -> Vec<ChangeEvent> {
        self.inner.lock().events.iter().cloned().collect()
    }

    /// Number of retained events
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().events.len()
    }

    /// True if nothing is retained
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().events.is_empty()
    }

    /// Events recorded since creation, including dropped ones
    #[must_use]
    pub fn total_recorded(&self) -> u64 {
        self.inner.lock().recorded
    }

    /// Receive events recorded from now on
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }
}
