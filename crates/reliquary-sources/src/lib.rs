//! Reliquary Source Lists
//!
//! Candidate locations for the authoritative artifact.
//!
//! # Overview
//!
//! - **SourceEntry**: a URI tagged with its [`Role`]
//! - **SourceList**: artist partition first, collector partition second
//! - **SourceChange**: the notification each successful mutation yields
//!
//! # Example
//!
//! ```rust
//! use reliquary_sources::{Role, SourceList};
//!
//! let mut list = SourceList::new();
//! list.add_artist_source("ipfs://bafy-original").unwrap();
//! list.add_collector_source("https://mirror.example/img.png").unwrap();
//!
//! let combined = list.combined_ordered();
//! assert_eq!(combined[0].role, Role::Artist);
//! assert_eq!(combined[1].role, Role::Collector);
//! ```

#![warn(missing_docs)]

pub mod list;
pub mod source;

// Re-exports
pub use list::{SourceError, SourceList};
pub use source::{Removal, Role, SourceChange, SourceEntry};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
