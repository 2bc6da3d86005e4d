//! Lossless byte codec
//!
//! LZ4 block compression with the uncompressed length prepended as a
//! little-endian `u32`. The framing is what [`decompress`] validates: a
//! missing prefix, an oversized declared length, a corrupt block or a
//! length mismatch all surface as [`CodecError::MalformedInput`].

/// Bytes used by the length prefix
pub const LENGTH_PREFIX_LEN: usize = 4;

/// Default ceiling on the declared decompressed length (16 MiB)
pub const DEFAULT_MAX_DECOMPRESSED_LEN: usize = 16 * 1024 * 1024;

/// Errors produced while decoding
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// The byte stream does not conform to the codec framing
    #[error("malformed input: {reason}")]
    MalformedInput { reason: String },
}

impl CodecError {
    fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedInput {
            reason: reason.into(),
        }
    }
}

/// Compress a byte buffer
///
/// Deterministic and total; empty input yields a valid (non-empty) frame.
#[inline]
#[must_use]
pub fn compress(input: &[u8]) -> Vec<u8> {
    lz4_flex::compress_prepend_size(input)
}

/// Decompress a frame produced by [`compress`]
///
/// # Errors
/// Returns [`CodecError::MalformedInput`] on any framing violation
#[inline]
pub fn decompress(input: &[u8]) -> Result<Vec<u8>, CodecError> {
    decompress_bounded(input, DEFAULT_MAX_DECOMPRESSED_LEN)
}

/// Decompress, refusing frames that declare more than `max_len` bytes
///
/// The declared length is checked before any allocation.
///
/// # Errors
/// Returns [`CodecError::MalformedInput`] on any framing violation
pub fn decompress_bounded(input: &[u8], max_len: usize) -> Result<Vec<u8>, CodecError> {
    if input.len() < LENGTH_PREFIX_LEN {
        return Err(CodecError::malformed(format!(
            "frame is {} bytes, shorter than the length prefix",
            input.len()
        )));
    }
    let (prefix, body) = input.split_at(LENGTH_PREFIX_LEN);
    let declared = u32::from_le_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]) as usize;

    if declared > max_len {
        return Err(CodecError::malformed(format!(
            "declared length {declared} exceeds limit {max_len}"
        )));
    }

    let out = lz4_flex::decompress(body, declared)
        .map_err(|e| CodecError::malformed(format!("corrupt block: {e}")))?;

    if out.len() != declared {
        return Err(CodecError::malformed(format!(
            "decoded {} bytes, frame declared {declared}",
            out.len()
        )));
    }

    tracing::trace!(compressed = input.len(), decompressed = out.len(), "frame decoded");
    Ok(out)
}
