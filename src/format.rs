//! Layout constants and command identifiers for Source 2 demo containers.
//!
//! A demo file starts with a fixed 16-byte header:
//!
//! | Offset | Size | Type | Field |
//! |--------|------|------|-------|
//! | 0x00 | 8 | bytes | Magic `PBDEMS2\0` |
//! | 0x08 | 4 | u32 LE | Offset of the file info trailer |
//! | 0x0C | 4 | u32 LE | Offset of the spawn groups record |
//!
//! Every record after the header is framed as `cmd`, `tick`, `size` varints
//! followed by `size` payload bytes. Bit `0x40` of `cmd` marks a snappy
//! compressed payload.
//!
//! # Example
//!
//! ```
//! use dota_report_parser::format::{has_demo_magic, DemoCommand};
//!
//! assert!(has_demo_magic(b"PBDEMS2\x00\x10\x00\x00\x00"));
//! assert_eq!(DemoCommand::from_raw(0x42), (DemoCommand::FileInfo, true));
//! ```

/// The magic bytes at the start of a Source 2 demo.
pub const DEMO_MAGIC: &[u8; 8] = b"PBDEMS2\x00";

/// Size of the fixed container header in bytes.
pub const HEADER_SIZE: usize = 16;

/// Byte offset of the trailer offset field within the header.
pub const TRAILER_OFFSET_POS: usize = 8;

/// Byte offset of the spawn groups offset field within the header.
pub const SPAWN_GROUPS_OFFSET_POS: usize = 12;

/// Command flag marking a snappy-compressed payload.
pub const COMPRESSED_FLAG: u64 = 0x40;

/// Returns whether `data` starts with the demo magic.
#[must_use]
pub fn has_demo_magic(data: &[u8]) -> bool {
    data.starts_with(DEMO_MAGIC)
}

/// Demo command identifiers (the `cmd` varint with the compression flag
/// removed).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemoCommand {
    /// End of the demo stream.
    Stop,
    /// Leading file header.
    FileHeader,
    /// File info trailer with playback and game summary.
    FileInfo,
    /// Marks the end of signon data.
    SyncTick,
    /// Serializer tables.
    SendTables,
    /// Class id to class name table.
    ClassInfo,
    /// String table snapshots.
    StringTables,
    /// Network packet.
    Packet,
    /// Signon network packet.
    SignonPacket,
    /// Console command.
    ConsoleCmd,
    /// Custom data block.
    CustomData,
    /// Custom data callbacks.
    CustomDataCallbacks,
    /// User command.
    UserCmd,
    /// Full entity snapshot packet.
    FullPacket,
    /// Save game block.
    SaveGame,
    /// Spawn group manifest.
    SpawnGroups,
    /// Animation data.
    AnimationData,
    /// Animation header.
    AnimationHeader,
    /// Any command this crate does not know about.
    Unknown(u64),
}

impl DemoCommand {
    /// Splits a raw `cmd` value into its command and compression flag.
    #[must_use]
    pub fn from_raw(raw: u64) -> (Self, bool) {
        let compressed = raw & COMPRESSED_FLAG != 0;
        let command = match raw & !COMPRESSED_FLAG {
            0 => DemoCommand::Stop,
            1 => DemoCommand::FileHeader,
            2 => DemoCommand::FileInfo,
            3 => DemoCommand::SyncTick,
            4 => DemoCommand::SendTables,
            5 => DemoCommand::ClassInfo,
            6 => DemoCommand::StringTables,
            7 => DemoCommand::Packet,
            8 => DemoCommand::SignonPacket,
            9 => DemoCommand::ConsoleCmd,
            10 => DemoCommand::CustomData,
            11 => DemoCommand::CustomDataCallbacks,
            12 => DemoCommand::UserCmd,
            13 => DemoCommand::FullPacket,
            14 => DemoCommand::SaveGame,
            15 => DemoCommand::SpawnGroups,
            16 => DemoCommand::AnimationData,
            17 => DemoCommand::AnimationHeader,
            other => DemoCommand::Unknown(other),
        };
        (command, compressed)
    }
}
