//! Authorized-writer capability
//!
//! Ownership and holder tracking live outside this crate. Reliquary only
//! asks the injected [`Authority`] two questions about a caller.

use crate::types::Principal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// External capability check supplied by the ownership component
#[cfg_attr(test, mockall::automock)]
pub trait Authority: Send + Sync {
    /// Whether `caller` is the artist
    fn is_artist(&self, caller: &Principal) -> bool;

    /// Whether `caller` currently holds the artifact
    fn is_current_holder(&self, caller: &Principal) -> bool;
}

/// Every mutating entry point, named for authorization and logging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    ReplaceChunks,
    AppendChunks,
    SetDigest,
    AddArtistSource,
    ReplaceArtistSources,
    AddCollectorSource,
    RemoveCollectorSource,
    SetMode,
    SetSelection,
}

/// Who may perform an [`Action`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Artist only
    Artist,
    /// Artist or current holder
    ArtistOrHolder,
}

impl Action {
    /// Capability the caller must hold
    #[must_use]
    pub const fn required_capability(self) -> Capability {
        match self {
            Self::ReplaceChunks
            | Self::AppendChunks
            | Self::SetDigest
            | Self::AddArtistSource
            | Self::ReplaceArtistSources => Capability::Artist,
            Self::AddCollectorSource
            | Self::RemoveCollectorSource
            | Self::SetMode
            | Self::SetSelection => Capability::ArtistOrHolder,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ReplaceChunks => "replace chunks",
            Self::AppendChunks => "append chunks",
            Self::SetDigest => "set the expected digest",
            Self::AddArtistSource => "add an artist source",
            Self::ReplaceArtistSources => "replace artist sources",
            Self::AddCollectorSource => "add a collector source",
            Self::RemoveCollectorSource => "remove a collector source",
            Self::SetMode => "set the display mode",
            Self::SetSelection => "set the selected source",
        };
        f.write_str(name)
    }
}

/// Check `caller` against the capability `action` requires
#[must_use]
pub fn permits(authority: &dyn Authority, caller: &Principal, action: Action) -> bool {
    match action.required_capability() {
        Capability::Artist => authority.is_artist(caller),
        Capability::ArtistOrHolder => {
            authority.is_artist(caller) || authority.is_current_holder(caller)
        }
    }
}
