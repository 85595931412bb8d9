//! Decompression of demo command payloads.
//!
//! Source 2 demos compress individual command payloads with raw (unframed)
//! snappy. A command is compressed when bit `0x40` of its `cmd` varint is set;
//! see [`crate::format::COMPRESSED_FLAG`].
//!
//! # Usage
//!
//! ```
//! use dota_report_parser::decompress::decompress_payload;
//!
//! let plain = decompress_payload(b"already plain", false).unwrap();
//! assert_eq!(&*plain, b"already plain");
//! ```

use std::borrow::Cow;

use tracing::trace;

use crate::error::{ParserError, Result};

/// Decompresses a raw snappy block.
///
/// # Errors
///
/// Returns `ParserError::DecompressionError` if the block is corrupted or
/// declares an implausible decompressed length.
pub fn decompress_snappy(data: &[u8]) -> Result<Vec<u8>> {
    let expected = snap::raw::decompress_len(data).map_err(|e| ParserError::DecompressionError {
        reason: format!("invalid snappy length header: {e}"),
    })?;
    trace!(compressed = data.len(), expected, "decompressing snappy block");

    snap::raw::Decoder::new()
        .decompress_vec(data)
        .map_err(|e| ParserError::DecompressionError {
            reason: format!("snappy decompression failed: {e}"),
        })
}

/// Returns the payload ready for decoding, decompressing it if `compressed`.
///
/// Uncompressed payloads are borrowed without copying.
///
/// # Errors
///
/// Returns `ParserError::DecompressionError` if a compressed payload is
/// invalid.
pub fn decompress_payload(data: &[u8], compressed: bool) -> Result<Cow<'_, [u8]>> {
    if compressed {
        decompress_snappy(data).map(Cow::Owned)
    } else {
        Ok(Cow::Borrowed(data))
    }
}
