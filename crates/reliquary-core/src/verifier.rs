//! Retrieval verifier
//!
//! Walks the combined candidate list in order, fetches each candidate,
//! hashes what comes back and accepts the first one whose SHA-256 equals
//! the expected digest.
//!
//! ## Ordering
//!
//! Up to `max_in_flight` fetches may run ahead speculatively, but results
//! are consumed strictly in candidate order (`buffered`, not
//! `buffer_unordered`). The accepted candidate is therefore always the
//! lowest-index match, whatever the latency of the others. Fetches still
//! in flight at acceptance are dropped.
//!
//! ## Fail-closed
//!
//! Without an expected digest nothing is fetched and nothing is accepted.

use crate::error::{Attempt, AttemptOutcome, ReliquaryError, VerifyFailure};
use crate::fetch::Fetcher;
use crate::types::VerifierConfig;
use futures::stream::{self, StreamExt};
use reliquary_artifact::ContentDigest;
use reliquary_sources::SourceEntry;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Content accepted by a verification run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedArtifact {
    /// Position of the accepted candidate in the combined order
    pub index: usize,
    /// Accepted candidate
    pub source: SourceEntry,
    /// Digest the content hashed to (equal to the expected digest)
    pub digest: ContentDigest,
    /// Verified bytes
    pub content: Vec<u8>,
    /// Candidates rejected before this one
    pub rejected: Vec<Attempt>,
}

/// Digest-verified, ordered, fail-over retrieval
pub struct RetrievalVerifier {
    fetcher: Arc<dyn Fetcher>,
    config: VerifierConfig,
    stats: Counters,
}

#[derive(Default)]
struct Counters {
    runs: AtomicU64,
    accepted: AtomicU64,
    failed: AtomicU64,
    fetch_failures: AtomicU64,
    timeouts: AtomicU64,
    mismatches: AtomicU64,
}

/// Public statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct VerifierStats {
    pub runs: u64,
    pub accepted: u64,
    pub failed: u64,
    pub fetch_failures: u64,
    pub timeouts: u64,
    pub mismatches: u64,
}

impl RetrievalVerifier {
    /// Create a verifier over the given fetch capability
    #[must_use]
    pub fn new(fetcher: Arc<dyn Fetcher>, config: VerifierConfig) -> Self {
        Self {
            fetcher,
            config,
            stats: Counters::default(),
        }
    }

    /// Run verification over `candidates`
    ///
    /// # Errors
    /// [`ReliquaryError::NoVerifiedSourceAvailable`] with the reason:
    /// digest unset, no candidates, or every candidate rejected
    pub async fn verify(
        &self,
        expected: Option<ContentDigest>,
        candidates: &[SourceEntry],
    ) -> Result<VerifiedArtifact, ReliquaryError> {
        self.stats.runs.fetch_add(1, Ordering::Relaxed);

        let Some(expected) = expected else {
            warn!(candidates = candidates.len(), "expected digest unset, refusing all candidates");
            return Err(self.fail(VerifyFailure::DigestUnset));
        };
        if candidates.is_empty() {
            warn!(digest = %expected.short(), "no candidate sources configured");
            return Err(self.fail(VerifyFailure::NoCandidates));
        }

        let start = Instant::now();
        let timeout = self.config.fetch_timeout();
        let in_flight = self.config.max_in_flight.max(1);

        let mut results = stream::iter(candidates.iter().cloned().enumerate())
            .map(|(index, source)| {
                let fetcher = Arc::clone(&self.fetcher);
                async move {
                    let result = tokio::time::timeout(timeout, fetcher.fetch(&source.uri)).await;
                    (index, source, result)
                }
            })
            .buffered(in_flight);

        let mut rejected = Vec::new();
        while let Some((index, source, result)) = results.next().await {
            let outcome = match result {
                Err(_) => {
                    self.stats.timeouts.fetch_add(1, Ordering::Relaxed);
                    AttemptOutcome::TimedOut
                }
                Ok(Err(e)) => {
                    self.stats.fetch_failures.fetch_add(1, Ordering::Relaxed);
                    AttemptOutcome::FetchFailed {
                        error: e.to_string(),
                    }
                }
                Ok(Ok(content)) => {
                    let actual = ContentDigest::compute(&content);
                    if actual == expected {
                        self.stats.accepted.fetch_add(1, Ordering::Relaxed);
                        info!(
                            index,
                            uri = %source.uri,
                            role = %source.role,
                            size = content.len(),
                            rejected = rejected.len(),
                            time_ms = start.elapsed().as_millis(),
                            "candidate verified"
                        );
                        return Ok(VerifiedArtifact {
                            index,
                            source,
                            digest: actual,
                            content,
                            rejected,
                        });
                    }
                    self.stats.mismatches.fetch_add(1, Ordering::Relaxed);
                    AttemptOutcome::DigestMismatch { actual }
                }
            };

            debug!(index, uri = %source.uri, outcome = %outcome, "candidate rejected");
            rejected.push(Attempt {
                index,
                source,
                outcome,
            });
        }

        warn!(
            digest = %expected.short(),
            attempts = rejected.len(),
            time_ms = start.elapsed().as_millis(),
            "no candidate verified"
        );
        Err(self.fail(VerifyFailure::NoneVerified { attempts: rejected }))
    }

    fn fail(&self, reason: VerifyFailure) -> ReliquaryError {
        self.stats.failed.fetch_add(1, Ordering::Relaxed);
        ReliquaryError::NoVerifiedSourceAvailable(reason)
    }

    /// Snapshot of run counters
    #[must_use]
    pub fn stats(&self) -> VerifierStats {
        VerifierStats {
            runs: self.stats.runs.load(Ordering::Relaxed),
            accepted: self.stats.accepted.load(Ordering::Relaxed),
            failed: self.stats.failed.load(Ordering::Relaxed),
            fetch_failures: self.stats.fetch_failures.load(Ordering::Relaxed),
            timeouts: self.stats.timeouts.load(Ordering::Relaxed),
            mismatches: self.stats.mismatches.load(Ordering::Relaxed),
        }
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }
}

impl std::fmt::Debug for RetrievalVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievalVerifier")
            .field("config", &self.config)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}
