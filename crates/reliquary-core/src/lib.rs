//! Reliquary Core - preserved artifact with verified retrieval
//!
//! Ties the byte-level storage and the source lists together behind one
//! serialization point:
//! - Authorizes every mutation against an injected [`Authority`]
//! - Stores the compressed thumbnail as chunked segments
//! - Keeps artist and collector candidate sources
//! - Serves direct or digest-verified output depending on [`DisplayMode`]
//! - Records every accepted change as a [`ChangeEvent`]
//!
//! # Example
//!
//! ```rust,ignore
//! use reliquary_core::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn example(authority: Arc<dyn Authority>) -> Result<(), ReliquaryError> {
//! let reliquary = Reliquary::new(
//!     ReliquaryConfig::new(),
//!     authority,
//!     Arc::new(FileFetcher::new()),
//! )?;
//!
//! let artist = Principal::new("artist");
//! reliquary.store_image(&artist, b"thumbnail")?;
//! reliquary.add_artist_source(&artist, "file:///srv/full.png")?;
//! reliquary.set_mode(&artist, DisplayMode::Verified)?;
//!
//! let rendering = reliquary.render().await?;
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod authority;
pub mod error;
pub mod events;
pub mod fetch;
pub mod mode;
pub mod reliquary;
pub mod types;
pub mod verifier;

pub use authority::{permits, Action, Authority, Capability};
pub use error::{Attempt, AttemptOutcome, ReliquaryError, VerifyFailure};
pub use events::{ChangeEvent, ChangeKind, EventId, EventLog};
pub use fetch::{FetchError, FileFetcher, Fetcher};
pub use mode::{ModeController, Rendering};
pub use reliquary::{Reliquary, StateSnapshot};
pub use types::{
    CodecConfig, DisplayMode, DisplayState, EventsConfig, Principal, ReliquaryConfig,
    StoreConfig, VerifierConfig, DEFAULT_EVENTS_RETAINED, DEFAULT_FETCH_TIMEOUT_MS,
    DEFAULT_MAX_CHUNK_SIZE,
};
pub use verifier::{RetrievalVerifier, VerifiedArtifact, VerifierStats};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with Reliquary Core
    pub use crate::{
        Authority, DisplayMode, FetchError, Fetcher, FileFetcher, Principal, Reliquary,
        ReliquaryConfig, ReliquaryError, Rendering, VerifiedArtifact,
    };
    pub use reliquary_artifact::ContentDigest;
    pub use reliquary_sources::{Role, SourceEntry};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
