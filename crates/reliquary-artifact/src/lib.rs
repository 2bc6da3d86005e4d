//! Reliquary Artifact Storage
//!
//! Byte-level building blocks for preserving an artifact on a constrained
//! store.
//!
//! # Core Concepts
//!
//! - [`ContentDigest`]: 32-byte SHA-256 digest used for verification
//! - [`compress`] / [`decompress`]: lossless LZ77-family codec (LZ4 blocks)
//! - [`ChunkStore`]: ordered sequence of immutable [`Segment`]s
//! - [`split_chunks`]: pre-split a payload to a per-write size limit
//!
//! # Example
//!
//! ```rust
//! use reliquary_artifact::{compress, decompress, split_chunks, ChunkStore};
//!
//! let frame = compress(b"ABCDE");
//! let mut store = ChunkStore::new();
//! store.replace_all(split_chunks(&frame, 2).unwrap());
//!
//! let restored = decompress(&store.reassemble().unwrap()).unwrap();
//! assert_eq!(restored, b"ABCDE");
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod chunk;
mod codec;
mod digest;

pub use chunk::{split_chunks, ChunkError, ChunkStore, Segment};
pub use codec::{
    compress, decompress, decompress_bounded, CodecError, DEFAULT_MAX_DECOMPRESSED_LEN,
    LENGTH_PREFIX_LEN,
};
pub use digest::{ContentDigest, DigestError, DIGEST_LEN};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
