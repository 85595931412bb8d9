//! Error types for the replay report parser.
//!
//! This module defines the error hierarchy for every failure the parser can
//! report: I/O and layout problems while reading the container trailer,
//! decoding failures of the trailer payload, roster resolution timeouts and
//! corrupted event streams.

use thiserror::Error;

/// The main error type for replay parsing operations.
///
/// The header path can fail with `InvalidHeader`, `TruncatedTrailer`,
/// `DecompressionError`, `MalformedFileInfo` or `MissingEndTime`. The roster
/// path fails with `ResolutionTimeout` and the report path with
/// `CorruptStream`. None of them carry a partial result.
///
/// # Example
///
/// ```
/// use dota_report_parser::error::{ParserError, Result};
///
/// fn example_operation() -> Result<()> {
///     Err(ParserError::InvalidHeader {
///         reason: "trailer offset beyond end of file".to_string(),
///     })
/// }
/// ```
#[derive(Error, Debug)]
pub enum ParserError {
    /// An I/O error occurred while reading the replay file.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The 16-byte container header is unusable.
    ///
    /// Returned when the file is shorter than the header or when the trailer
    /// offset does not point inside the file. A wrong magic alone is not an
    /// error.
    #[error("Invalid header: {reason}")]
    InvalidHeader {
        /// A description of what makes the header invalid.
        reason: String,
    },

    /// The data ended before the trailer record could be read completely.
    #[error("Truncated trailer: expected {expected} bytes, but only {available} available")]
    TruncatedTrailer {
        /// The number of bytes that were needed.
        expected: u64,
        /// The number of bytes actually available.
        available: u64,
    },

    /// Snappy decompression of a demo command payload failed.
    #[error("Decompression failed: {reason}")]
    DecompressionError {
        /// A description of the decompression failure.
        reason: String,
    },

    /// The trailer payload is not a valid file info message.
    #[error("Malformed file info: {0}")]
    MalformedFileInfo(#[from] prost::DecodeError),

    /// The file info carries no game info or a zero end time.
    #[error("Match end time not found in file info")]
    MissingEndTime,

    /// The roster could not be fully resolved before the tick ceiling.
    #[error("Player data not resolved within {max_ticks} ticks")]
    ResolutionTimeout {
        /// The tick ceiling that was exceeded.
        max_ticks: u32,
    },

    /// The event stream failed or the pass faulted while consuming it.
    ///
    /// `context` lists the last packet markers seen, which usually points at
    /// a truncated or corrupted replay.
    #[error("Corrupt stream at tick {tick}: {reason} ({context})")]
    CorruptStream {
        /// The last tick observed before the failure.
        tick: u32,
        /// The underlying fault.
        reason: String,
        /// Last-seen packet markers.
        context: String,
    },

    /// A line of a recorded event stream could not be parsed.
    #[error("Invalid event record on line {line}: {reason}")]
    InvalidEventRecord {
        /// 1-based line number.
        line: usize,
        /// Why the line was rejected.
        reason: String,
    },
}

impl ParserError {
    /// Creates a `TruncatedTrailer` error with the given sizes.
    ///
    /// # Arguments
    ///
    /// * `expected` - The number of bytes that were needed
    /// * `available` - The number of bytes actually available
    #[must_use]
    pub fn truncated(expected: u64, available: u64) -> Self {
        ParserError::TruncatedTrailer { expected, available }
    }
}

/// Converts a byte slice to a hexadecimal string representation.
///
/// If the slice is 8 bytes or less, formats as space-separated hex values.
/// If longer, shows the first 8 bytes followed by "...".
pub(crate) fn bytes_to_hex(bytes: &[u8]) -> String {
    if bytes.len() <= 8 {
        bytes
            .iter()
            .map(|b| format!("{b:02X}"))
            .collect::<Vec<_>>()
            .join(" ")
    } else {
        let prefix: String = bytes[..8]
            .iter()
            .map(|b| format!("{b:02X}"))
            .collect::<Vec<_>>()
            .join(" ");
        format!("{prefix}... ({} bytes total)", bytes.len())
    }
}

/// A specialized Result type for replay parsing operations.
pub type Result<T> = std::result::Result<T, ParserError>;
