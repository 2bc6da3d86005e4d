//! Testing utilities for Reliquary workspace
//!
//! Shared fixtures: principals, a settable authority, a scripted fetcher
//! and reliquary setup helpers.

#![allow(missing_docs)]

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use reliquary_artifact::ContentDigest;
use reliquary_core::{Authority, FetchError, Fetcher, Principal, Reliquary, ReliquaryConfig};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

pub const ARTIST: &str = "artist";
pub const HOLDER: &str = "holder";
pub const STRANGER: &str = "stranger";

pub fn artist() -> Principal {
    Principal::new(ARTIST)
}

pub fn holder() -> Principal {
    Principal::new(HOLDER)
}

pub fn stranger() -> Principal {
    Principal::new(STRANGER)
}

/// Authority with a fixed artist and a transferable holder
#[derive(Debug)]
pub struct FixedAuthority {
    artist: Principal,
    holder: RwLock<Principal>,
}

impl FixedAuthority {
    pub fn new(artist: Principal, holder: Principal) -> Self {
        Self {
            artist,
            holder: RwLock::new(holder),
        }
    }

    /// Move the artifact to a new holder
    pub fn transfer(&self, to: Principal) {
        *self.holder.write() = to;
    }
}

impl Default for FixedAuthority {
    fn default() -> Self {
        Self::new(artist(), holder())
    }
}

impl Authority for FixedAuthority {
    fn is_artist(&self, caller: &Principal) -> bool {
        *caller == self.artist
    }

    fn is_current_holder(&self, caller: &Principal) -> bool {
        *caller == *self.holder.read()
    }
}

#[derive(Debug, Clone)]
enum Reply {
    Bytes(Vec<u8>),
    Unreachable,
    Delayed(Duration, Vec<u8>),
}

/// In-memory fetcher keyed by URI; unknown URIs are `NotFound`
#[derive(Debug, Default)]
pub struct StaticFetcher {
    replies: HashMap<String, Reply>,
    calls: Mutex<Vec<String>>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `content` at `uri`
    #[must_use]
    pub fn serve(mut self, uri: &str, content: &[u8]) -> Self {
        self.replies.insert(uri.to_string(), Reply::Bytes(content.to_vec()));
        self
    }

    /// Serve `content` at `uri` after `delay`
    #[must_use]
    pub fn serve_after(mut self, uri: &str, delay: Duration, content: &[u8]) -> Self {
        self.replies
            .insert(uri.to_string(), Reply::Delayed(delay, content.to_vec()));
        self
    }

    /// Fail every fetch of `uri`
    #[must_use]
    pub fn unreachable(mut self, uri: &str) -> Self {
        self.replies.insert(uri.to_string(), Reply::Unreachable);
        self
    }

    /// URIs fetched so far, in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl Fetcher for StaticFetcher {
    async fn fetch(&self, uri: &str) -> Result<Vec<u8>, FetchError> {
        self.calls.lock().push(uri.to_string());
        match self.replies.get(uri).cloned() {
            Some(Reply::Bytes(bytes)) => Ok(bytes),
            Some(Reply::Delayed(delay, bytes)) => {
                tokio::time::sleep(delay).await;
                Ok(bytes)
            }
            Some(Reply::Unreachable) => Err(FetchError::Unreachable(uri.to_string())),
            None => Err(FetchError::NotFound(uri.to_string())),
        }
    }
}

/// Hex digest of `content`
pub fn digest_hex(content: &[u8]) -> String {
    ContentDigest::compute(content).to_string()
}

/// Reliquary wired to a default [`FixedAuthority`] and `fetcher`
pub fn setup_reliquary(fetcher: StaticFetcher) -> (Reliquary, Arc<FixedAuthority>, Arc<StaticFetcher>) {
    setup_reliquary_with(ReliquaryConfig::new(), fetcher)
}

pub fn setup_reliquary_with(
    config: ReliquaryConfig,
    fetcher: StaticFetcher,
) -> (Reliquary, Arc<FixedAuthority>, Arc<StaticFetcher>) {
    let authority = Arc::new(FixedAuthority::default());
    let fetcher = Arc::new(fetcher);
    let reliquary = Reliquary::new(config, authority.clone(), fetcher.clone()).unwrap();
    (reliquary, authority, fetcher)
}
