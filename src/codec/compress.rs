//! Optional gzip pre-processing for large shard payloads
//!
//! Compression runs before encryption so the envelope marker recording
//! whether a payload is compressed is itself authenticated. Empty input
//! is a safe no-op in both directions.

use std::io::{Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use super::errors::CodecResult;

/// Envelope marker: payload bytes are stored as-is.
pub const MARKER_PLAIN: u8 = 0x00;
/// Envelope marker: payload bytes are gzip-compressed.
pub const MARKER_COMPRESSED: u8 = 0x01;

/// Gzip-compresses `data`. Empty input round-trips unchanged.
pub fn compress(data: &[u8]) -> CodecResult<Vec<u8>> {
    if data.is_empty() {
        return Ok(Vec::new());
    }
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Reverses [`compress`]. Empty input round-trips unchanged.
pub fn decompress(data: &[u8]) -> CodecResult<Vec<u8>> {
    if data.is_empty() {
        return Ok(Vec::new());
    }
    let mut decoder = GzDecoder::new(data);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

/// Wraps `payload` with the envelope marker, compressing when `should_compress`.
pub fn wrap_envelope(payload: &[u8], should_compress: bool) -> CodecResult<Vec<u8>> {
    let (marker, body) = if should_compress {
        (MARKER_COMPRESSED, compress(payload)?)
    } else {
        (MARKER_PLAIN, payload.to_vec())
    };
    let mut wrapped = Vec::with_capacity(1 + body.len());
    wrapped.push(marker);
    wrapped.extend_from_slice(&body);
    Ok(wrapped)
}

/// Unwraps a payload produced by [`wrap_envelope`].
pub fn unwrap_envelope(wrapped: &[u8]) -> CodecResult<Vec<u8>> {
    match wrapped.split_first() {
        Some((&MARKER_COMPRESSED, body)) => decompress(body),
        Some((_, body)) => Ok(body.to_vec()),
        // Legacy payloads written before the marker existed.
        None => Ok(Vec::new()),
    }
}
