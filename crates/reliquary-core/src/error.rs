//! Error types for Reliquary Core
//!
//! Every failure is fatal to the call that raised it. Nothing is retried
//! internally; retry policy belongs to the caller.

use crate::authority::Action;
use crate::types::Principal;
use reliquary_artifact::{ChunkError, CodecError, ContentDigest, DigestError};
use reliquary_sources::{SourceEntry, SourceError};
use serde::Serialize;
use std::fmt;

/// Main Reliquary error type
#[derive(Debug, thiserror::Error)]
pub enum ReliquaryError {
    /// Chunk storage failure (`NotFound` before any write)
    #[error(transparent)]
    Chunk(#[from] ChunkError),

    /// Codec framing violation
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Source list validation failure
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Caller lacks the capability for the action
    #[error("{principal} is not authorized to {action}")]
    Unauthorized { principal: Principal, action: Action },

    /// Direct-mode selection does not index the artist list
    #[error("selected index {index} is out of range for {len} artist sources")]
    InvalidSelection { index: usize, len: usize },

    /// No candidate served content matching the expected digest
    #[error("no verified source available: {0}")]
    NoVerifiedSourceAvailable(VerifyFailure),

    /// Expected digest is not a 32-byte hex value
    #[error("invalid digest: {0}")]
    InvalidDigest(#[from] DigestError),

    /// Configuration rejected
    #[error("configuration error: {0}")]
    Config(String),

    /// Snapshot could not be encoded or decoded
    #[error("snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),
}

impl ReliquaryError {
    /// Read attempted before anything was stored
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Chunk(ChunkError::NotFound))
    }

    /// Worth retrying later: only verification depends on remote state
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::NoVerifiedSourceAvailable(VerifyFailure::NoneVerified { .. })
        )
    }
}

/// Why verification produced nothing
///
/// Separates "nothing configured" from "configured but nothing verified".
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerifyFailure {
    /// Expected digest unset; every candidate is refused
    #[error("expected digest is not set")]
    DigestUnset,

    /// Neither partition holds a candidate
    #[error("no candidate sources are configured")]
    NoCandidates,

    /// Every candidate failed, timed out or mismatched
    #[error("none of {n} candidates verified", n = .attempts.len())]
    NoneVerified { attempts: Vec<Attempt> },
}

/// One candidate tried during a verification run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attempt {
    /// Position in the combined candidate order
    pub index: usize,
    /// Candidate tried
    pub source: SourceEntry,
    /// What happened
    pub outcome: AttemptOutcome,
}

/// Result of trying a single candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AttemptOutcome {
    /// Fetch returned an error
    FetchFailed { error: String },
    /// Fetch exceeded the per-candidate timeout
    TimedOut,
    /// Content fetched but hashed to something else
    DigestMismatch { actual: ContentDigest },
}

impl fmt::Display for AttemptOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FetchFailed { error } => write!(f, "fetch failed: {error}"),
            Self::TimedOut => f.write_str("timed out"),
            Self::DigestMismatch { actual } => write!(f, "digest mismatch ({})", actual.short()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reliquary_sources::Role;

    #[test]
    fn not_found_predicate() {
        let err = ReliquaryError::from(ChunkError::NotFound);
        assert!(err.is_not_found());
        assert!(!ReliquaryError::InvalidSelection { index: 3, len: 2 }.is_not_found());
    }

    #[test]
    fn failure_reasons_are_distinguishable() {
        let unset = ReliquaryError::NoVerifiedSourceAvailable(VerifyFailure::DigestUnset);
        let empty = ReliquaryError::NoVerifiedSourceAvailable(VerifyFailure::NoCandidates);
        let none = ReliquaryError::NoVerifiedSourceAvailable(VerifyFailure::NoneVerified {
            attempts: vec![Attempt {
                index: 0,
                source: SourceEntry::new("A", Role::Artist),
                outcome: AttemptOutcome::TimedOut,
            }],
        });

        assert!(unset.to_string().contains("not set"));
        assert!(empty.to_string().contains("no candidate sources"));
        assert!(none.to_string().contains("none of 1 candidates"));
        assert!(none.is_retryable());
        assert!(!empty.is_retryable());
    }

    #[test]
    fn unauthorized_display() {
        let err = ReliquaryError::Unauthorized {
            principal: Principal::new("mallory"),
            action: Action::SetDigest,
        };
        assert_eq!(
            err.to_string(),
            "mallory is not authorized to set the expected digest"
        );
    }
}
