//! Display mode controller
//!
//! Two states, no automatic transitions. The selected index is persisted
//! in either mode and only checked against the artist list on read.

use crate::error::ReliquaryError;
use crate::types::{DisplayMode, DisplayState};
use crate::verifier::VerifiedArtifact;

/// What the outside world receives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendering {
    /// The selected artist source, unverified
    Direct { uri: String },
    /// Content accepted by the retrieval verifier
    Verified(VerifiedArtifact),
}

/// Holds [`DisplayState`] and resolves direct-mode output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModeController {
    state: DisplayState,
}

impl ModeController {
    /// Start in [`DisplayMode::Direct`] at index 0
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted state
    #[inline]
    #[must_use]
    pub fn from_state(state: DisplayState) -> Self {
        Self { state }
    }

    /// Current state
    #[inline]
    #[must_use]
    pub fn state(&self) -> DisplayState {
        self.state
    }

    /// Current mode
    #[inline]
    #[must_use]
    pub fn mode(&self) -> DisplayMode {
        self.state.mode
    }

    /// Set mode, returning the previous one
    pub fn set_mode(&mut self, mode: DisplayMode) -> DisplayMode {
        std::mem::replace(&mut self.state.mode, mode)
    }

    /// Set the direct-mode index, returning the previous one
    ///
    /// Not range-checked here: the artist list may grow or shrink later.
    pub fn select(&mut self, index: usize) -> usize {
        std::mem::replace(&mut self.state.selected_index, index)
    }

    /// The artist source direct mode shows
    ///
    /// # Errors
    /// [`ReliquaryError::InvalidSelection`] if the index is out of range,
    /// including when the artist list is empty
    pub fn direct_output<'a>(&self, artist_sources: &'a [String]) -> Result<&'a str, ReliquaryError> {
        artist_sources
            .get(self.state.selected_index)
            .map(String::as_str)
            .ok_or(ReliquaryError::InvalidSelection {
                index: self.state.selected_index,
                len: artist_sources.len(),
            })
    }
}
