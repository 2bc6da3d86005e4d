//! Core types for Reliquary
//!
//! Defines the fundamental types shared across the facade:
//! - Caller identity ([`Principal`])
//! - Display mode and selection state
//! - Configuration loaded from TOML and the environment

use crate::error::ReliquaryError;
use reliquary_artifact::DEFAULT_MAX_DECOMPRESSED_LEN;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Opaque caller identity, interpreted only by the injected authority
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Principal(pub String);

impl Principal {
    /// Create principal
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identifier string
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Principal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Principal {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// What the outside world is shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    /// A single pre-selected artist source, shown as-is
    #[default]
    Direct,
    /// Whatever the retrieval verifier accepts
    Verified,
}

/// Persisted display selection
///
/// `selected_index` is stored as given; it is validated against the artist
/// list only when read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DisplayState {
    /// Current mode
    pub mode: DisplayMode,
    /// Index into the artist partition used in [`DisplayMode::Direct`]
    pub selected_index: usize,
}

/// Default per-write chunk limit (24 KiB)
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 24 * 1024;

/// Default per-candidate fetch timeout
pub const DEFAULT_FETCH_TIMEOUT_MS: u64 = 10_000;

/// Change events kept in memory by default
pub const DEFAULT_EVENTS_RETAINED: usize = 1024;

/// Reliquary configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReliquaryConfig {
    /// Chunk storage settings
    pub store: StoreConfig,
    /// Codec settings
    pub codec: CodecConfig,
    /// Retrieval verifier settings
    pub verifier: VerifierConfig,
    /// Change event settings
    pub events: EventsConfig,
}

/// Chunk storage settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Largest chunk `store_image` will write
    pub max_chunk_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
        }
    }
}

/// Codec settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Largest decompressed thumbnail accepted
    pub max_decompressed_len: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_decompressed_len: DEFAULT_MAX_DECOMPRESSED_LEN,
        }
    }
}

/// Retrieval verifier settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    /// Per-candidate fetch timeout in milliseconds
    pub fetch_timeout_ms: u64,
    /// Fetches allowed in flight at once (1 = strictly sequential)
    pub max_in_flight: usize,
}

impl VerifierConfig {
    /// Fetch timeout as a duration
    #[inline]
    #[must_use]
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_ms: DEFAULT_FETCH_TIMEOUT_MS,
            max_in_flight: 1,
        }
    }
}

/// Change event settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    /// Broadcast buffer per subscriber
    pub channel_capacity: usize,
    /// Events kept in the in-memory log; the oldest are dropped first
    pub retained: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 256,
            retained: DEFAULT_EVENTS_RETAINED,
        }
    }
}

impl ReliquaryConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from TOML; missing keys take defaults
    ///
    /// # Errors
    /// Returns [`ReliquaryError::Config`] on parse or validation failure
    pub fn from_toml_str(s: &str) -> Result<Self, ReliquaryError> {
        let config: Self =
            toml::from_str(s).map_err(|e| ReliquaryError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overlaid with `RELIQUARY_*` environment variables
    ///
    /// # Errors
    /// Returns [`ReliquaryError::Config`] if a variable does not parse
    pub fn from_env() -> Result<Self, ReliquaryError> {
        Self::default().with_env_overrides()
    }

    /// Overlay `RELIQUARY_*` environment variables
    ///
    /// # Errors
    /// Returns [`ReliquaryError::Config`] if a variable does not parse
    pub fn with_env_overrides(self) -> Result<Self, ReliquaryError> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Overlay values from an arbitrary key lookup
    ///
    /// Recognized keys: `RELIQUARY_MAX_CHUNK_SIZE`,
    /// `RELIQUARY_FETCH_TIMEOUT_MS`, `RELIQUARY_MAX_IN_FLIGHT`.
    ///
    /// # Errors
    /// Returns [`ReliquaryError::Config`] if a value does not parse or the
    /// result fails validation
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Result<Self, ReliquaryError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = parse_override(&lookup, "RELIQUARY_MAX_CHUNK_SIZE")? {
            self.store.max_chunk_size = v;
        }
        if let Some(v) = parse_override(&lookup, "RELIQUARY_FETCH_TIMEOUT_MS")? {
            self.verifier.fetch_timeout_ms = v;
        }
        if let Some(v) = parse_override(&lookup, "RELIQUARY_MAX_IN_FLIGHT")? {
            self.verifier.max_in_flight = v;
        }
        self.validate()?;
        Ok(self)
    }

    /// With max chunk size
    #[inline]
    #[must_use]
    pub fn with_max_chunk_size(mut self, size: usize) -> Self {
        self.store.max_chunk_size = size;
        self
    }

    /// With per-candidate fetch timeout
    #[inline]
    #[must_use]
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.verifier.fetch_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// With speculative fetch pipelining
    #[inline]
    #[must_use]
    pub fn with_max_in_flight(mut self, n: usize) -> Self {
        self.verifier.max_in_flight = n;
        self
    }

    /// With change-log retention
    #[inline]
    #[must_use]
    pub fn with_event_retention(mut self, n: usize) -> Self {
        self.events.retained = n;
        self
    }

    /// Reject settings the runtime cannot honor
    ///
    /// # Errors
    /// Returns [`ReliquaryError::Config`] naming the offending key
    pub fn validate(&self) -> Result<(), ReliquaryError> {
        if self.store.max_chunk_size == 0 {
            return Err(ReliquaryError::Config(
                "store.max_chunk_size must be greater than zero".into(),
            ));
        }
        if self.verifier.fetch_timeout_ms == 0 {
            return Err(ReliquaryError::Config(
                "verifier.fetch_timeout_ms must be greater than zero".into(),
            ));
        }
        if self.verifier.max_in_flight == 0 {
            return Err(ReliquaryError::Config(
                "verifier.max_in_flight must be greater than zero".into(),
            ));
        }
        if self.events.channel_capacity == 0 {
            return Err(ReliquaryError::Config(
                "events.channel_capacity must be greater than zero".into(),
            ));
        }
        if self.events.retained == 0 {
            return Err(ReliquaryError::Config(
                "events.retained must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

fn parse_override<F, T>(lookup: &F, key: &str) -> Result<Option<T>, ReliquaryError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|e| ReliquaryError::Config(format!("{key}={raw}: {e}")))
        })
        .transpose()
}
