//! Reliquary command line
//!
//! File-system front end over the artifact crates:
//! - `digest`: SHA-256 of a file
//! - `pack` / `unpack`: compress and chunk an image into a directory, and back
//! - `verify`: digest-verified retrieval over local candidates

#![warn(unreachable_pub)]
#![allow(missing_docs)]

use anyhow::{bail, Context, Result};
use clap::{value_parser, Arg, ArgAction, Command};
use reliquary_artifact::{compress, decompress_bounded, split_chunks, ChunkStore, ContentDigest};
use reliquary_core::{
    FileFetcher, ReliquaryConfig, ReliquaryError, RetrievalVerifier, VerifiedArtifact,
};
use reliquary_sources::{SourceEntry, SourceError, SourceList};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

const CHUNK_PREFIX: &str = "chunk-";
const CHUNK_SUFFIX: &str = ".bin";

/// File name of the chunk at `index`
#[must_use]
pub fn chunk_file_name(index: usize) -> String {
    format!("{CHUNK_PREFIX}{index:04}{CHUNK_SUFFIX}")
}

/// Command definition
#[must_use]
pub fn build_cli() -> Command {
    Command::new("reliquary")
        .version(reliquary_core::VERSION)
        .about("Preserve artifact thumbnails and verify full-resolution copies")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file; RELIQUARY_* variables override it"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .subcommand(
            Command::new("digest").about("Print the SHA-256 digest of a file").arg(
                Arg::new("file")
                    .required(true)
                    .value_parser(value_parser!(PathBuf)),
            ),
        )
        .subcommand(
            Command::new("pack")
                .about("Compress a file and split it into chunk files")
                .arg(
                    Arg::new("file")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("out")
                        .long("out")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Directory to write chunk files into"),
                )
                .arg(
                    Arg::new("chunk-size")
                        .long("chunk-size")
                        .value_parser(value_parser!(usize))
                        .help("Maximum bytes per chunk"),
                ),
        )
        .subcommand(
            Command::new("unpack")
                .about("Reassemble chunk files and decompress them")
                .arg(
                    Arg::new("dir")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("out")
                        .long("out")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("File to write the restored image to"),
                ),
        )
        .subcommand(
            Command::new("verify")
                .about("Fetch candidates in order and accept the first matching the digest")
                .arg(
                    Arg::new("digest")
                        .long("digest")
                        .required(true)
                        .help("Expected SHA-256 digest (hex)"),
                )
                .arg(
                    Arg::new("timeout-ms")
                        .long("timeout-ms")
                        .value_parser(value_parser!(u64))
                        .help("Per-candidate fetch timeout"),
                )
                .arg(
                    Arg::new("in-flight")
                        .long("in-flight")
                        .value_parser(value_parser!(usize))
                        .help("Candidates fetched concurrently"),
                )
                .arg(
                    Arg::new("collector")
                        .long("collector")
                        .action(ArgAction::Append)
                        .help("Collector candidate, tried after all artist candidates"),
                )
                .arg(
                    Arg::new("uri")
                        .action(ArgAction::Append)
                        .help("Artist candidates: local paths or file:// URIs"),
                ),
        )
}

/// Load config from an optional TOML file, then apply environment overrides
///
/// # Errors
/// Unreadable file or invalid configuration
pub fn load_config(path: Option<&Path>) -> Result<ReliquaryConfig> {
    let config = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            ReliquaryConfig::from_toml_str(&text)?
        }
        None => ReliquaryConfig::new(),
    };
    let config = config.with_env_overrides()?;
    config.validate()?;
    Ok(config)
}

/// SHA-256 of a file
///
/// # Errors
/// Unreadable file
pub fn digest_file(path: &Path) -> Result<ContentDigest> {
    let data = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(ContentDigest::compute(&data))
}

/// Outcome of [`pack`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackReport {
    pub chunks: usize,
    pub original_len: usize,
    pub compressed_len: usize,
    pub digest: ContentDigest,
}

/// Compress `input` and write it to `out_dir` as numbered chunk files
///
/// # Errors
/// I/O failure or a zero chunk size
pub fn pack(input: &Path, out_dir: &Path, chunk_size: usize) -> Result<PackReport> {
    let data = std::fs::read(input).with_context(|| format!("reading {}", input.display()))?;
    let frame = compress(&data);
    let chunks = split_chunks(&frame, chunk_size)?;

    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;
    for (index, chunk) in chunks.iter().enumerate() {
        let path = out_dir.join(chunk_file_name(index));
        std::fs::write(&path, chunk).with_context(|| format!("writing {}", path.display()))?;
        debug!(path = %path.display(), len = chunk.len(), "chunk written");
    }

    let report = PackReport {
        chunks: chunks.len(),
        original_len: data.len(),
        compressed_len: frame.len(),
        digest: ContentDigest::compute(&data),
    };
    info!(
        chunks = report.chunks,
        original = report.original_len,
        compressed = report.compressed_len,
        "packed"
    );
    Ok(report)
}

/// Index encoded in a chunk file name, `None` if the name is not a chunk
///
/// # Errors
/// A chunk-shaped name whose index is not a decimal number
pub fn chunk_index(name: &str) -> Result<Option<usize>> {
    let Some(digits) = name
        .strip_prefix(CHUNK_PREFIX)
        .and_then(|rest| rest.strip_suffix(CHUNK_SUFFIX))
    else {
        return Ok(None);
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        bail!("malformed chunk file name {name}");
    }
    Ok(Some(digits.parse().with_context(|| format!("chunk index in {name}"))?))
}

/// Chunk files in `dir`, ordered by chunk index
///
/// # Errors
/// Unreadable directory, a malformed chunk name, or a duplicate or missing
/// index in the sequence
pub fn chunk_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("listing {}", dir.display()))? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        if let Some(index) = chunk_index(name)? {
            files.push((index, path));
        }
    }
    files.sort_by_key(|(index, _)| *index);

    for (expected, (index, path)) in files.iter().enumerate() {
        if *index != expected {
            bail!(
                "chunk sequence broken at {}: expected index {expected}",
                path.display()
            );
        }
    }
    Ok(files.into_iter().map(|(_, path)| path).collect())
}

/// Reassemble the chunk files in `dir`, decompress and write to `out`
///
/// Returns the restored length.
///
/// # Errors
/// No chunk files, I/O failure or a malformed frame
pub fn unpack(dir: &Path, out: &Path, max_len: usize) -> Result<usize> {
    let files = chunk_files(dir)?;
    if files.is_empty() {
        bail!("no chunk files in {}", dir.display());
    }

    let mut store = ChunkStore::new();
    let mut segments = Vec::with_capacity(files.len());
    for path in &files {
        segments.push(std::fs::read(path).with_context(|| format!("reading {}", path.display()))?);
    }
    store.replace_all(segments);

    let image = decompress_bounded(&store.reassemble()?, max_len)?;
    std::fs::write(out, &image).with_context(|| format!("writing {}", out.display()))?;
    info!(chunks = files.len(), len = image.len(), "unpacked");
    Ok(image.len())
}

/// Candidates in combined order: artist URIs first, then collector URIs
///
/// # Errors
/// An empty identifier, or a duplicate within one role
pub fn candidates(artist: &[String], collector: &[String]) -> Result<Vec<SourceEntry>, SourceError> {
    let mut list = SourceList::new();
    for uri in artist {
        list.add_artist_source(uri.as_str())?;
    }
    for uri in collector {
        list.add_collector_source(uri.as_str())?;
    }
    Ok(list.combined_ordered())
}

/// Run the retrieval verifier over local candidates
///
/// # Errors
/// Malformed digest, or the verifier's failure report
pub async fn verify(
    config: &ReliquaryConfig,
    digest_hex: &str,
    candidates: &[SourceEntry],
) -> Result<VerifiedArtifact, ReliquaryError> {
    let expected = ContentDigest::parse_normalized(digest_hex)?;
    let verifier = RetrievalVerifier::new(Arc::new(FileFetcher::new()), config.verifier);
    verifier.verify(expected, candidates).await
}

/// Apply `verify` subcommand flags to `config`
#[must_use]
pub fn with_verify_flags(
    config: ReliquaryConfig,
    timeout_ms: Option<u64>,
    in_flight: Option<usize>,
) -> ReliquaryConfig {
    let config = match timeout_ms {
        Some(ms) => config.with_fetch_timeout(Duration::from_millis(ms)),
        None => config,
    };
    match in_flight {
        Some(n) => config.with_max_in_flight(n),
        None => config,
    }
}
