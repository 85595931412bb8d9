//! Header and trailer parsing for Source 2 demo containers.
//!
//! The container header is only 16 bytes; its useful content is the offset
//! of the file info trailer, a self-describing record appended at the end of
//! the recording. The trailer holds the playback length and the game summary,
//! including the match completion time.
//!
//! # Usage
//!
//! ```no_run
//! use std::fs::File;
//! use dota_report_parser::header::read_match_date;
//!
//! let mut file = File::open("match.dem").unwrap();
//! let finished_at = read_match_date(&mut file).unwrap();
//! println!("Match finished at {finished_at}");
//! ```

pub mod trailer;

pub use trailer::{
    read_file_info, read_match_date, read_trailer, MatchSummary, SummaryPlayer, TrailerRecord,
};

use tracing::warn;

use crate::binary::{read_bytes, read_u32_le};
use crate::error::{bytes_to_hex, ParserError, Result};
use crate::format::{
    has_demo_magic, DEMO_MAGIC, HEADER_SIZE, SPAWN_GROUPS_OFFSET_POS, TRAILER_OFFSET_POS,
};

/// The fixed 16-byte demo container header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemoHeader {
    /// The first eight bytes of the file.
    pub magic: [u8; 8],

    /// Absolute offset of the file info trailer.
    pub trailer_offset: u32,

    /// Absolute offset of the spawn groups record.
    pub spawn_groups_offset: u32,
}

impl DemoHeader {
    /// Parses the header from the first bytes of a demo.
    ///
    /// A magic mismatch is logged but tolerated; replays with an unexpected
    /// magic are still read through their trailer offset.
    ///
    /// # Errors
    ///
    /// Returns `ParserError::InvalidHeader` if fewer than 16 bytes are given.
    ///
    /// # Example
    ///
    /// ```
    /// use dota_report_parser::header::DemoHeader;
    ///
    /// let data = b"PBDEMS2\x00\x00\x10\x00\x00\x20\x00\x00\x00";
    /// let header = DemoHeader::parse(data).unwrap();
    /// assert_eq!(header.trailer_offset, 0x1000);
    /// assert!(header.has_valid_magic());
    /// ```
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_SIZE {
            return Err(ParserError::InvalidHeader {
                reason: format!(
                    "file is {} bytes, shorter than the {HEADER_SIZE}-byte header",
                    data.len()
                ),
            });
        }

        let mut magic = [0u8; 8];
        magic.copy_from_slice(read_bytes(data, 0, DEMO_MAGIC.len())?);

        if !has_demo_magic(&magic) {
            warn!(
                expected = %bytes_to_hex(DEMO_MAGIC),
                found = %bytes_to_hex(&magic),
                "unexpected demo magic, continuing with trailer offset"
            );
        }

        Ok(DemoHeader {
            magic,
            trailer_offset: read_u32_le(data, TRAILER_OFFSET_POS)?,
            spawn_groups_offset: read_u32_le(data, SPAWN_GROUPS_OFFSET_POS)?,
        })
    }

    /// Returns whether the magic matches `PBDEMS2\0`.
    #[must_use]
    pub fn has_valid_magic(&self) -> bool {
        has_demo_magic(&self.magic)
    }

    /// Checks that the trailer offset lies inside a file of `file_size` bytes.
    ///
    /// # Errors
    ///
    /// Returns `ParserError::InvalidHeader` if the offset is at or beyond the
    /// end of the file.
    pub fn validate_trailer_offset(&self, file_size: u64) -> Result<()> {
        if u64::from(self.trailer_offset) >= file_size {
            return Err(ParserError::InvalidHeader {
                reason: format!(
                    "trailer offset {} is outside the {file_size}-byte file",
                    self.trailer_offset
                ),
            });
        }
        Ok(())
    }
}
