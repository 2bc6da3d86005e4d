//! Candidate fetching
//!
//! Transport is an external capability: the verifier only sees the
//! [`Fetcher`] trait. [`FileFetcher`] covers local paths and `file://` URIs.

use async_trait::async_trait;
use std::path::PathBuf;

/// Fetch failure for a single candidate
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Candidate could not be reached
    #[error("unreachable: {0}")]
    Unreachable(String),

    /// Candidate answered but holds nothing at this location
    #[error("not found: {0}")]
    NotFound(String),

    /// URI scheme this fetcher does not handle
    #[error("unsupported scheme in {0}")]
    UnsupportedScheme(String),

    /// Local I/O failure
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Retrieves the bytes behind a candidate URI
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch the full content at `uri`
    ///
    /// # Errors
    /// Any failure; the verifier treats all of them as "try the next one"
    async fn fetch(&self, uri: &str) -> Result<Vec<u8>, FetchError>;
}

/// Reads candidates from the local file system
#[derive(Debug, Clone, Default)]
pub struct FileFetcher {
    root: Option<PathBuf>,
}

impl FileFetcher {
    /// Resolve relative paths against the working directory
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative paths against `root`
    #[inline]
    #[must_use]
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn resolve(&self, uri: &str) -> Result<PathBuf, FetchError> {
        let path = match uri.split_once("://") {
            Some(("file", rest)) => rest,
            Some(_) => return Err(FetchError::UnsupportedScheme(uri.to_string())),
            None => uri,
        };
        let path = PathBuf::from(path);
        Ok(match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path,
        })
    }
}

#[async_trait]
impl Fetcher for FileFetcher {
    async fn fetch(&self, uri: &str) -> Result<Vec<u8>, FetchError> {
        let path = self.resolve(uri)?;
        tokio::fs::read(&path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => FetchError::NotFound(path.display().to_string()),
            _ => FetchError::Io(e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_plain_and_file_uris() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("image.png");
        std::fs::write(&path, b"pixels").unwrap();

        let fetcher = FileFetcher::new();
        assert_eq!(fetcher.fetch(path.to_str().unwrap()).await.unwrap(), b"pixels");

        let uri = format!("file://{}", path.display());
        assert_eq!(fetcher.fetch(&uri).await.unwrap(), b"pixels");
    }

    #[tokio::test]
    async fn relative_paths_use_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.bin"), b"A").unwrap();

        let fetcher = FileFetcher::with_root(dir.path());
        assert_eq!(fetcher.fetch("a.bin").await.unwrap(), b"A");
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = FileFetcher::with_root(dir.path());
        assert!(matches!(
            fetcher.fetch("missing.bin").await,
            Err(FetchError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn network_schemes_unsupported() {
        let fetcher = FileFetcher::new();
        assert!(matches!(
            fetcher.fetch("https://example.com/a.png").await,
            Err(FetchError::UnsupportedScheme(_))
        ));
    }
}
