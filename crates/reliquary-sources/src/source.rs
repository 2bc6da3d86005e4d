//! Source entries and the changes a list reports

use serde::{Deserialize, Serialize};
use std::fmt;

/// Who controls a source partition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Authoritative partition, controlled by the artist
    Artist,
    /// Supplementary partition, controlled by the current holder
    Collector,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Artist => f.write_str("artist"),
            Self::Collector => f.write_str("collector"),
        }
    }
}

/// A candidate location plus its provenance
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceEntry {
    /// Location identifier (URI)
    pub uri: String,
    /// Partition the entry belongs to
    pub role: Role,
}

impl SourceEntry {
    /// Create entry
    #[inline]
    #[must_use]
    pub fn new(uri: impl Into<String>, role: Role) -> Self {
        Self {
            uri: uri.into(),
            role,
        }
    }
}

impl fmt::Display for SourceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.uri, self.role)
    }
}

/// How an element left a partition
///
/// Removal is O(1): the last element moves into the vacated slot, so the
/// ordering after `index` is not preserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Removal {
    /// Swap-with-last then pop
    SwapRemove {
        /// Slot that was vacated
        index: usize,
        /// Former index of the element now occupying `index`, if one moved
        moved_from: Option<usize>,
    },
}

/// Change notification emitted by a successful mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceChange {
    /// An identifier was appended to a partition
    Added { uri: String, role: Role },
    /// An identifier was removed from a partition
    Removed {
        uri: String,
        role: Role,
        removal: Removal,
    },
    /// The artist partition was replaced wholesale
    ArtistSourcesReplaced { count: usize },
}

impl SourceChange {
    /// Identifier added or removed; `None` for a wholesale replacement
    #[must_use]
    pub fn uri(&self) -> Option<&str> {
        match self {
            Self::Added { uri, .. } | Self::Removed { uri, .. } => Some(uri),
            Self::ArtistSourcesReplaced { .. } => None,
        }
    }
}
