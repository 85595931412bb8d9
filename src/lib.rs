//! # Dota Report Parser
//!
//! Reconstructs when, and by whom, players were reported in a Dota 2 replay
//! (.dem), together with roster context (team, hero, name) and the match's
//! real-world completion date.
//!
//! The library has two independent entry points:
//! - **Trailer reading**: the completion date and game summary are read
//!   straight from the container trailer, without decoding the event stream
//! - **Stream analysis**: report actions and the roster are reconstructed
//!   from a forward-only stream of decoded events supplied by an
//!   [`EventSource`](stream::EventSource)
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::fs::File;
//! use std::path::Path;
//!
//! use dota_report_parser::analysis::{parse_replay, ReportTarget};
//! use dota_report_parser::config::ParserConfig;
//! use dota_report_parser::error::Result;
//! use dota_report_parser::header::read_match_date;
//! use dota_report_parser::stream::RecordedSource;
//!
//! fn summarize(replay: &Path, events: &Path) -> Result<()> {
//!     let finished_at = read_match_date(&mut File::open(replay)?)?;
//!     println!("Finished at: {finished_at}");
//!
//!     let mut source = RecordedSource::from_path(events)?;
//!     let result = parse_replay(
//!         7_123_456_789,
//!         &mut source,
//!         ReportTarget::Slot(3),
//!         &ParserConfig::default(),
//!     )?;
//!     for report in &result.reports {
//!         println!(
//!             "{} {} reported {} ({})",
//!             report.time, report.reporter_name, report.target_name, report.reporter_team_label
//!         );
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Overview
//!
//! - [`error`] - Error types and result alias for parser operations
//! - [`binary`] - Little-endian and varint readers
//! - [`format`] - Container constants and demo command ids
//! - [`proto`] - Protobuf messages of the file info trailer
//! - [`decompress`] - Snappy payload decompression
//! - [`header`] - Container header and trailer reading
//! - [`stream`] - The event-stream boundary and recorded streams
//! - [`clock`] - Tick to match time conversion
//! - [`roster`] - Ten-slot roster and hero resolution
//! - [`scoreboard`] - Scoreboard geometry and report hover tracking
//! - [`report`] - Confirmed reports and pass results
//! - [`config`] - Pass configuration
//! - [`analysis`] - The report and roster passes
//!
//! ## Format Reference
//!
//! - 16-byte header: `PBDEMS2\0` magic, then the trailer offset and the
//!   spawn groups offset as little-endian u32
//! - Trailer: varint command, tick and size followed by a `CDemoFileInfo`
//!   payload, snappy compressed when bit `0x40` of the command is set

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod analysis;
pub mod binary;
pub mod clock;
pub mod config;
pub mod decompress;
pub mod error;
pub mod format;
pub mod header;
pub mod proto;
pub mod report;
pub mod roster;
pub mod scoreboard;
pub mod stream;

// Re-export commonly used types at the crate root
pub use analysis::{extract_player_info, parse_replay, ReportTarget};
pub use clock::{MatchClock, MatchTime, TICK_RATE};
pub use config::ParserConfig;
pub use error::{ParserError, Result};
pub use header::{read_match_date, DemoHeader, MatchSummary};
pub use report::{ParseResult, Report, TeamLabel};
pub use roster::PlayerResource;
pub use stream::{EntitySnapshot, EventSink, EventSource, RecordedSource};
