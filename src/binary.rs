//! Binary reading utilities for the demo container.
//!
//! This module provides functions for reading little-endian integers, byte
//! slices and LEB128-style variable-length integers. All functions perform
//! bounds checking and return `ParserError::TruncatedTrailer` for data that
//! ends too early.
//!
//! # Varints
//!
//! Demo commands are framed by unsigned varints: 7 payload bits per byte,
//! least significant group first, with the high bit set on every byte except
//! the last. A `u64` needs at most 10 bytes.
//!
//! # Example
//!
//! ```
//! use dota_report_parser::binary::{read_u32_le, read_uvarint_from};
//!
//! let data = [0x26, 0x89, 0x01, 0x00, 0xAC, 0x02];
//!
//! assert_eq!(read_u32_le(&data, 0).unwrap(), 100_646);
//!
//! // 0xAC 0x02 encodes 300
//! let mut varint = &data[4..];
//! assert_eq!(read_uvarint_from(&mut varint).unwrap(), 300);
//! assert!(varint.is_empty());
//! ```

use std::io::{ErrorKind, Read};

use crate::error::{ParserError, Result};

/// Maximum number of bytes a `u64` varint may occupy.
pub const MAX_VARINT_LEN: usize = 10;

/// Reads a little-endian u32 value from the byte buffer at the given offset.
///
/// # Errors
///
/// Returns `ParserError::TruncatedTrailer` if the buffer doesn't contain
/// at least 4 bytes starting from the given offset.
///
/// # Example
///
/// ```
/// use dota_report_parser::binary::read_u32_le;
///
/// let data = [0x78, 0x56, 0x34, 0x12];
/// assert_eq!(read_u32_le(&data, 0).unwrap(), 0x12345678);
/// ```
pub fn read_u32_le(bytes: &[u8], offset: usize) -> Result<u32> {
    let slice = read_bytes(bytes, offset, 4)?;
    Ok(u32::from_le_bytes([slice[0], slice[1], slice[2], slice[3]]))
}

/// Reads a slice of bytes from the buffer at the given offset.
///
/// # Errors
///
/// Returns `ParserError::TruncatedTrailer` if the buffer doesn't contain
/// at least `len` bytes starting from the given offset.
///
/// # Example
///
/// ```
/// use dota_report_parser::binary::read_bytes;
///
/// let data = b"PBDEMS2\x00\x10\x00\x00\x00";
/// assert_eq!(read_bytes(data, 0, 7).unwrap(), b"PBDEMS2");
/// ```
pub fn read_bytes(bytes: &[u8], offset: usize, len: usize) -> Result<&[u8]> {
    let end = offset.saturating_add(len);
    if end > bytes.len() {
        return Err(ParserError::truncated(end as u64, bytes.len() as u64));
    }

    Ok(&bytes[offset..end])
}

/// Reads an unsigned varint directly from a reader, one byte at a time.
///
/// # Errors
///
/// - `ParserError::TruncatedTrailer` if the reader hits end of file mid-varint
/// - `ParserError::InvalidHeader` if the varint overflows 64 bits
/// - `ParserError::IoError` for any other read failure
pub fn read_uvarint_from<R: Read + ?Sized>(reader: &mut R) -> Result<u64> {
    let mut value = 0u64;
    let mut buf = [0u8; 1];

    for i in 0..MAX_VARINT_LEN {
        match reader.read_exact(&mut buf) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                return Err(ParserError::truncated((i + 1) as u64, i as u64));
            }
            Err(e) => return Err(e.into()),
        }
        value = accumulate(value, buf[0], i)?;
        if buf[0] & 0x80 == 0 {
            return Ok(value);
        }
    }

    Err(varint_overflow())
}

fn accumulate(value: u64, byte: u8, index: usize) -> Result<u64> {
    // The tenth byte may only contribute the single remaining bit.
    if index == MAX_VARINT_LEN - 1 && byte > 1 {
        return Err(varint_overflow());
    }
    Ok(value | (u64::from(byte & 0x7F) << (7 * index)))
}

fn varint_overflow() -> ParserError {
    ParserError::InvalidHeader {
        reason: "varint overflows a 64-bit integer".to_string(),
    }
}
