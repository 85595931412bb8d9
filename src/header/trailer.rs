//! File info trailer reading.
//!
//! The trailer is located through the header's trailer offset and framed like
//! any other demo command:
//!
//! | Field | Encoding | Meaning |
//! |-------|----------|---------|
//! | cmd | varint | Command id, bit `0x40` = snappy compressed |
//! | tick | varint | Tick the record was written at (unused) |
//! | size | varint | Payload length in bytes |
//! | payload | `size` bytes | `CDemoFileInfo` protobuf |
//!
//! Reading the trailer only needs a seek and a few hundred bytes, so the
//! completion date can be extracted without decoding the event stream.

use std::io::{ErrorKind, Read, Seek, SeekFrom};

use chrono::{DateTime, Utc};
use prost::Message;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::DemoHeader;
use crate::binary::read_uvarint_from;
use crate::decompress::decompress_payload;
use crate::error::{ParserError, Result};
use crate::format::{DemoCommand, HEADER_SIZE};
use crate::proto::{CDemoFileInfo, CDotaGameInfo};

/// A raw trailer record as stored in the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrailerRecord {
    /// The command id with the compression flag removed.
    pub command: DemoCommand,

    /// Whether the payload is snappy compressed.
    pub compressed: bool,

    /// Tick the record was written at.
    pub tick: u64,

    /// The payload exactly as stored.
    pub payload: Vec<u8>,
}

impl TrailerRecord {
    /// Reads a framed record from the reader's current position.
    ///
    /// `available` is the number of bytes left in the source from the
    /// current position; a declared size larger than that is rejected before
    /// any allocation.
    ///
    /// # Errors
    ///
    /// Returns `ParserError::TruncatedTrailer` if the framing or the payload
    /// runs past the end of the source.
    pub fn read<R: Read + ?Sized>(reader: &mut R, available: u64) -> Result<Self> {
        let raw_command = read_uvarint_from(reader)?;
        let tick = read_uvarint_from(reader)?;
        let size = read_uvarint_from(reader)?;

        // Three varints have been consumed; `available` was measured before them.
        let framing = varint_len(raw_command) + varint_len(tick) + varint_len(size);
        let remaining = available.saturating_sub(framing);
        if size > remaining {
            return Err(ParserError::truncated(size, remaining));
        }

        let mut payload = vec![0u8; usize::try_from(size).unwrap_or(usize::MAX)];
        reader.read_exact(&mut payload).map_err(|e| {
            if e.kind() == ErrorKind::UnexpectedEof {
                ParserError::truncated(size, remaining)
            } else {
                e.into()
            }
        })?;

        let (command, compressed) = DemoCommand::from_raw(raw_command);
        Ok(TrailerRecord {
            command,
            compressed,
            tick,
            payload,
        })
    }

    /// Returns the payload, decompressed when the record is flagged.
    ///
    /// # Errors
    ///
    /// Returns `ParserError::DecompressionError` for an invalid snappy block.
    pub fn decode_payload(&self) -> Result<std::borrow::Cow<'_, [u8]>> {
        decompress_payload(&self.payload, self.compressed)
    }

    /// Decodes the payload as a `CDemoFileInfo` message.
    ///
    /// # Errors
    ///
    /// - `ParserError::DecompressionError` for an invalid snappy block
    /// - `ParserError::MalformedFileInfo` if the protobuf does not decode
    pub fn file_info(&self) -> Result<CDemoFileInfo> {
        if self.command != DemoCommand::FileInfo {
            warn!(command = ?self.command, "trailer record is not a file info command");
        }
        let payload = self.decode_payload()?;
        Ok(CDemoFileInfo::decode(payload.as_ref())?)
    }
}

/// Locates and reads the trailer record of a demo.
///
/// # Errors
///
/// - `ParserError::InvalidHeader` if the header is short or the trailer offset
///   lies outside the file
/// - `ParserError::TruncatedTrailer` if the trailer is cut off
/// - `ParserError::IoError` for seek or read failures
pub fn read_trailer<R: Read + Seek + ?Sized>(reader: &mut R) -> Result<TrailerRecord> {
    reader.seek(SeekFrom::Start(0))?;
    let mut head = Vec::with_capacity(HEADER_SIZE);
    (&mut *reader).take(HEADER_SIZE as u64).read_to_end(&mut head)?;
    let header = DemoHeader::parse(&head)?;

    let file_size = reader.seek(SeekFrom::End(0))?;
    header.validate_trailer_offset(file_size)?;

    let offset = reader.seek(SeekFrom::Start(u64::from(header.trailer_offset)))?;
    let record = TrailerRecord::read(reader, file_size - offset)?;
    debug!(
        offset,
        command = ?record.command,
        compressed = record.compressed,
        size = record.payload.len(),
        "read trailer record"
    );
    Ok(record)
}

/// Reads and decodes the file info trailer of a demo.
///
/// # Errors
///
/// See [`read_trailer`] and [`TrailerRecord::file_info`].
pub fn read_file_info<R: Read + Seek + ?Sized>(reader: &mut R) -> Result<CDemoFileInfo> {
    read_trailer(reader)?.file_info()
}

/// Extracts the real-world match completion time from a demo's trailer.
///
/// # Errors
///
/// Returns `ParserError::MissingEndTime` if the file info has no game info
/// or a zero end time, in addition to the errors of [`read_file_info`].
pub fn read_match_date<R: Read + Seek + ?Sized>(reader: &mut R) -> Result<DateTime<Utc>> {
    let info = read_file_info(reader)?;
    end_time(dota_info(&info)).ok_or(ParserError::MissingEndTime)
}

fn dota_info(info: &CDemoFileInfo) -> Option<&CDotaGameInfo> {
    info.game_info.as_ref()?.dota.as_ref()
}

fn end_time(dota: Option<&CDotaGameInfo>) -> Option<DateTime<Utc>> {
    let seconds = dota?.end_time.filter(|t| *t > 0)?;
    DateTime::from_timestamp(i64::from(seconds), 0)
}

fn varint_len(value: u64) -> u64 {
    let bits = 64 - u64::from(value.leading_zeros());
    bits.max(1).div_ceil(7)
}

/// Game summary carried by the trailer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchSummary {
    /// Match id recorded by the game.
    pub match_id: Option<u64>,

    /// Game mode id.
    pub game_mode: Option<i32>,

    /// Winning team (2 or 3).
    pub game_winner: Option<i32>,

    /// Match completion time.
    pub end_time: Option<DateTime<Utc>>,

    /// Playback length in ticks.
    pub playback_ticks: Option<i32>,

    /// Playback length in seconds.
    pub playback_seconds: Option<f32>,

    /// Players listed in the trailer, in trailer order.
    pub players: Vec<SummaryPlayer>,
}

/// One player entry of a [`MatchSummary`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryPlayer {
    /// Display name.
    pub name: String,
    /// Hero unit name.
    pub hero: String,
    /// 64-bit SteamID.
    pub steam_id: u64,
    /// Team number.
    pub team: i32,
    /// Whether the slot was a bot.
    pub is_bot: bool,
}

impl MatchSummary {
    /// Builds a summary from a decoded file info message.
    #[must_use]
    pub fn from_file_info(info: &CDemoFileInfo) -> Self {
        let dota = dota_info(info);

        MatchSummary {
            match_id: dota.and_then(|d| d.match_id),
            game_mode: dota.and_then(|d| d.game_mode),
            game_winner: dota.and_then(|d| d.game_winner),
            end_time: end_time(dota),
            playback_ticks: info.playback_ticks,
            playback_seconds: info.playback_time,
            players: dota
                .map(|d| {
                    d.player_info
                        .iter()
                        .map(|p| SummaryPlayer {
                            name: p.player_name.clone().unwrap_or_default(),
                            hero: p.hero_name.clone().unwrap_or_default(),
                            steam_id: p.steamid.unwrap_or_default(),
                            team: p.game_team.unwrap_or_default(),
                            is_bot: p.is_fake_client.unwrap_or_default(),
                        })
                        .collect()
                })
                .unwrap_or_default(),
        }
    }
}
