//! Partitioned source list
//!
//! Provides [`SourceList`]: an artist partition followed by a collector
//! partition, each unique on insert and each preserving insertion order
//! until a swap-remove reorders the collector tail.

use crate::source::{Removal, Role, SourceChange, SourceEntry};
use serde::{Deserialize, Serialize};

/// Validation failures for source mutations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    /// Empty identifier on insert
    #[error("source identifier must not be empty")]
    EmptyIdentifier,

    /// Identifier already present in the target partition
    #[error("{role} source already present: {uri}")]
    DuplicateIdentifier { uri: String, role: Role },

    /// Removal index beyond the partition length
    #[error("index {index} out of range for {len} {role} sources")]
    IndexOutOfRange { index: usize, len: usize, role: Role },
}

/// Ordered candidate locations, artist partition first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceList {
    artist: Vec<String>,
    collector: Vec<String>,
}

impl SourceList {
    /// Create empty list
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted partitions, taken as-is
    #[must_use]
    pub fn from_parts(artist: Vec<String>, collector: Vec<String>) -> Self {
        Self { artist, collector }
    }

    /// Append to the artist partition
    ///
    /// # Errors
    /// [`SourceError::EmptyIdentifier`] or [`SourceError::DuplicateIdentifier`]
    pub fn add_artist_source(&mut self, uri: impl Into<String>) -> Result<SourceChange, SourceError> {
        Self::insert(&mut self.artist, uri.into(), Role::Artist)
    }

    /// Append to the collector partition
    ///
    /// # Errors
    /// [`SourceError::EmptyIdentifier`] or [`SourceError::DuplicateIdentifier`]
    pub fn add_collector_source(
        &mut self,
        uri: impl Into<String>,
    ) -> Result<SourceChange, SourceError> {
        Self::insert(&mut self.collector, uri.into(), Role::Collector)
    }

    fn insert(
        partition: &mut Vec<String>,
        uri: String,
        role: Role,
    ) -> Result<SourceChange, SourceError> {
        if uri.is_empty() {
            return Err(SourceError::EmptyIdentifier);
        }
        if partition.contains(&uri) {
            return Err(SourceError::DuplicateIdentifier { uri, role });
        }
        partition.push(uri.clone());
        Ok(SourceChange::Added { uri, role })
    }

    /// Remove a collector source by swapping in the last element
    ///
    /// # Errors
    /// [`SourceError::IndexOutOfRange`] if `index >= collector_len()`
    pub fn remove_collector_source(&mut self, index: usize) -> Result<SourceChange, SourceError> {
        let len = self.collector.len();
        if index >= len {
            return Err(SourceError::IndexOutOfRange {
                index,
                len,
                role: Role::Collector,
            });
        }
        let last = len - 1;
        let uri = self.collector.swap_remove(index);
        Ok(SourceChange::Removed {
            uri,
            role: Role::Collector,
            removal: Removal::SwapRemove {
                index,
                moved_from: (index != last).then_some(last),
            },
        })
    }

    /// Replace the whole artist partition
    ///
    /// The new list is accepted verbatim, duplicates included.
    pub fn replace_artist_sources(&mut self, sources: Vec<String>) -> SourceChange {
        self.artist = sources;
        SourceChange::ArtistSourcesReplaced {
            count: self.artist.len(),
        }
    }

    /// Artist partition then collector partition
    #[must_use]
    pub fn combined_ordered(&self) -> Vec<SourceEntry> {
        self.artist
            .iter()
            .map(|uri| SourceEntry::new(uri.clone(), Role::Artist))
            .chain(
                self.collector
                    .iter()
                    .map(|uri| SourceEntry::new(uri.clone(), Role::Collector)),
            )
            .collect()
    }

    /// Artist partition in insertion order
    #[inline]
    #[must_use]
    pub fn artist_sources(&self) -> &[String] {
        &self.artist
    }

    /// Collector partition in its current order
    #[inline]
    #[must_use]
    pub fn collector_sources(&self) -> &[String] {
        &self.collector
    }

    /// Artist partition length
    #[inline]
    #[must_use]
    pub fn artist_len(&self) -> usize {
        self.artist.len()
    }

    /// Collector partition length
    #[inline]
    #[must_use]
    pub fn collector_len(&self) -> usize {
        self.collector.len()
    }

    /// True if both partitions are empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.artist.is_empty() && self.collector.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn uris(list: &[SourceEntry]) -> Vec<&str> {
        list.iter().map(|e| e.uri.as_str()).collect()
    }

    #[test]
    fn add_reports_change() {
        let mut list = SourceList::new();
        let change = list.add_artist_source("ipfs://a").unwrap();
        assert_eq!(
            change,
            SourceChange::Added {
                uri: "ipfs://a".into(),
                role: Role::Artist
            }
        );
    }

    #[test]
    fn empty_identifier_rejected() {
        let mut list = SourceList::new();
        assert_eq!(list.add_artist_source(""), Err(SourceError::EmptyIdentifier));
        assert_eq!(list.add_collector_source(""), Err(SourceError::EmptyIdentifier));
        assert!(list.is_empty());
    }

    #[test]
    fn duplicate_rejected_within_partition_only() {
        let mut list = SourceList::new();
        list.add_artist_source("ar://x").unwrap();
        assert!(matches!(
            list.add_artist_source("ar://x"),
            Err(SourceError::DuplicateIdentifier { role: Role::Artist, .. })
        ));
        assert!(list.add_collector_source("ar://x").is_ok());
        assert!(matches!(
            list.add_collector_source("ar://x"),
            Err(SourceError::DuplicateIdentifier { role: Role::Collector, .. })
        ));
    }

    #[test]
    fn combined_order_is_artist_then_collector() {
        let mut list = SourceList::new();
        list.add_collector_source("C1").unwrap();
        list.add_artist_source("A1").unwrap();
        list.add_collector_source("C2").unwrap();
        list.add_artist_source("A2").unwrap();
        let combined = list.combined_ordered();
        assert_eq!(uris(&combined), vec!["A1", "A2", "C1", "C2"]);
        assert_eq!(combined[2].role, Role::Collector);
    }

    #[test]
    fn swap_remove_moves_last_into_gap() {
        let mut list = SourceList::new();
        for uri in ["C0", "C1", "C2", "C3"] {
            list.add_collector_source(uri).unwrap();
        }
        let change = list.remove_collector_source(1).unwrap();
        assert_eq!(
            change,
            SourceChange::Removed {
                uri: "C1".into(),
                role: Role::Collector,
                removal: Removal::SwapRemove {
                    index: 1,
                    moved_from: Some(3)
                },
            }
        );
        assert_eq!(list.collector_sources(), ["C0", "C3", "C2"]);
    }

    #[test]
    fn removing_last_moves_nothing() {
        let mut list = SourceList::new();
        list.add_collector_source("C0").unwrap();
        list.add_collector_source("C1").unwrap();
        let change = list.remove_collector_source(1).unwrap();
        assert!(matches!(
            change,
            SourceChange::Removed {
                removal: Removal::SwapRemove { moved_from: None, .. },
                ..
            }
        ));
        assert_eq!(list.collector_sources(), ["C0"]);
    }

    #[test]
    fn remove_out_of_range() {
        let mut list = SourceList::new();
        list.add_collector_source("C0").unwrap();
        assert_eq!(
            list.remove_collector_source(1),
            Err(SourceError::IndexOutOfRange {
                index: 1,
                len: 1,
                role: Role::Collector
            })
        );
        assert_eq!(list.collector_len(), 1);
    }

    #[test]
    fn removed_uri_can_be_added_again() {
        let mut list = SourceList::new();
        list.add_collector_source("C0").unwrap();
        list.remove_collector_source(0).unwrap();
        assert!(list.add_collector_source("C0").is_ok());
    }

    #[test]
    fn replace_artist_keeps_duplicates_verbatim() {
        let mut list = SourceList::new();
        list.add_artist_source("old").unwrap();
        let change = list.replace_artist_sources(vec!["A".into(), "A".into(), "B".into()]);
        assert_eq!(change, SourceChange::ArtistSourcesReplaced { count: 3 });
        assert_eq!(list.artist_sources(), ["A", "A", "B"]);
        // Per-insert uniqueness still applies afterwards
        assert!(list.add_artist_source("B").is_err());
    }

    #[test]
    fn serde_round_trip_keeps_order() {
        let mut list = SourceList::new();
        list.add_artist_source("A").unwrap();
        list.add_collector_source("C").unwrap();
        let json = serde_json::to_string(&list).unwrap();
        let back: SourceList = serde_json::from_str(&json).unwrap();
        assert_eq!(back, list);
    }

    proptest! {
        #[test]
        fn prop_valid_remove_decrements_by_one(
            count in 1usize..32,
            pick in any::<proptest::sample::Index>(),
        ) {
            let mut list = SourceList::new();
            for i in 0..count {
                list.add_collector_source(format!("uri-{i}")).unwrap();
            }
            let index = pick.index(count);
            let before = list.collector_len();
            prop_assert!(list.remove_collector_source(index).is_ok());
            prop_assert_eq!(list.collector_len(), before - 1);
        }
    }
}
