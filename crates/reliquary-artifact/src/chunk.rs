//! Chunked segment storage
//!
//! [`ChunkStore`] holds an ordered sequence of immutable [`Segment`]s.
//! The store never inspects or limits segment sizes; callers pre-split
//! with [`split_chunks`] to respect whatever per-write limit the backing
//! medium imposes.

use std::sync::Arc;

/// Immutable byte segment, identified only by its position in a sequence
///
/// Backed by `Arc<[u8]>` so snapshots of a store share segment storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment(Arc<[u8]>);

impl Segment {
    /// Create from byte vector
    #[inline]
    #[must_use]
    pub fn new(data: Vec<u8>) -> Self {
        Self(data.into())
    }

    /// Get reference to bytes
    #[inline]
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.0
    }

    /// Segment length in bytes
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for Segment {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}

impl From<&[u8]> for Segment {
    fn from(data: &[u8]) -> Self {
        Self(data.into())
    }
}

/// Errors from chunk storage
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChunkError {
    /// Read attempted before any segment was written
    #[error("no segments stored")]
    NotFound,

    /// Splitting requested with a zero chunk size
    #[error("chunk size must be greater than zero")]
    ZeroChunkSize,
}

/// Ordered collection of immutable segments
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkStore {
    segments: Vec<Segment>,
}

impl ChunkStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from previously persisted segments
    #[must_use]
    pub fn from_segments(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    /// Discard the current sequence and write `chunks` as a new one
    pub fn replace_all<I, C>(&mut self, chunks: I)
    where
        I: IntoIterator<Item = C>,
        C: Into<Segment>,
    {
        self.segments = chunks.into_iter().map(Into::into).collect();
    }

    /// Append `chunks` after the current sequence, preserving order
    pub fn append<I, C>(&mut self, chunks: I)
    where
        I: IntoIterator<Item = C>,
        C: Into<Segment>,
    {
        self.segments.extend(chunks.into_iter().map(Into::into));
    }

    /// Concatenate all segments in order
    ///
    /// # Errors
    /// Returns [`ChunkError::NotFound`] if nothing has been written
    pub fn reassemble(&self) -> Result<Vec<u8>, ChunkError> {
        if self.segments.is_empty() {
            return Err(ChunkError::NotFound);
        }
        let mut out = Vec::with_capacity(self.total_bytes());
        for segment in &self.segments {
            out.extend_from_slice(segment.data());
        }
        Ok(out)
    }

    /// True iff at least one segment is stored
    #[inline]
    #[must_use]
    pub fn exists(&self) -> bool {
        !self.segments.is_empty()
    }

    /// Number of segments
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Check if empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Sum of segment lengths
    #[must_use]
    pub fn total_bytes(&self) -> usize {
        self.segments.iter().map(Segment::len).sum()
    }

    /// Read-only view of the segment sequence
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }
}

/// Split `data` into consecutive chunks of at most `max_chunk` bytes
///
/// Empty input yields a single empty chunk so the written sequence still
/// exists.
///
/// # Errors
/// Returns [`ChunkError::ZeroChunkSize`] if `max_chunk` is zero
pub fn split_chunks(data: &[u8], max_chunk: usize) -> Result<Vec<Vec<u8>>, ChunkError> {
    if max_chunk == 0 {
        return Err(ChunkError::ZeroChunkSize);
    }
    if data.is_empty() {
        return Ok(vec![Vec::new()]);
    }
    Ok(data.chunks(max_chunk).map(<[u8]>::to_vec).collect())
}
