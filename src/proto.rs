//! Protobuf messages carried by the demo file info trailer.
//!
//! Only the subset of `demo.proto` the trailer reader needs is declared here.
//! Field numbers follow the game's published definitions, so unknown fields in
//! newer replays are skipped by `prost`.

use prost::Message;

/// `CDemoFileInfo`: the payload of the trailer record.
#[derive(Clone, PartialEq, Message)]
pub struct CDemoFileInfo {
    /// Playback length in seconds.
    #[prost(float, optional, tag = "1")]
    pub playback_time: Option<f32>,

    /// Playback length in ticks.
    #[prost(int32, optional, tag = "2")]
    pub playback_ticks: Option<i32>,

    /// Playback length in frames.
    #[prost(int32, optional, tag = "3")]
    pub playback_frames: Option<i32>,

    /// Game specific summary.
    #[prost(message, optional, tag = "4")]
    pub game_info: Option<CGameInfo>,
}

/// `CGameInfo`: game specific section of the file info.
#[derive(Clone, PartialEq, Message)]
pub struct CGameInfo {
    /// Dota section.
    #[prost(message, optional, tag = "4")]
    pub dota: Option<CDotaGameInfo>,
}

/// `CGameInfo.CDotaGameInfo`.
#[derive(Clone, PartialEq, Message)]
pub struct CDotaGameInfo {
    /// Match id.
    #[prost(uint64, optional, tag = "1")]
    pub match_id: Option<u64>,

    /// Game mode id.
    #[prost(int32, optional, tag = "2")]
    pub game_mode: Option<i32>,

    /// Winning team (2 or 3).
    #[prost(int32, optional, tag = "3")]
    pub game_winner: Option<i32>,

    /// Per-player summary.
    #[prost(message, repeated, tag = "4")]
    pub player_info: Vec<CPlayerInfo>,

    /// League id, zero for public matches.
    #[prost(uint32, optional, tag = "5")]
    pub leagueid: Option<u32>,

    /// Radiant team id.
    #[prost(uint32, optional, tag = "7")]
    pub radiant_team_id: Option<u32>,

    /// Dire team id.
    #[prost(uint32, optional, tag = "8")]
    pub dire_team_id: Option<u32>,

    /// Radiant team tag.
    #[prost(string, optional, tag = "9")]
    pub radiant_team_tag: Option<String>,

    /// Dire team tag.
    #[prost(string, optional, tag = "10")]
    pub dire_team_tag: Option<String>,

    /// Match completion time in Unix seconds.
    #[prost(uint32, optional, tag = "11")]
    pub end_time: Option<u32>,
}

/// `CGameInfo.CDotaGameInfo.CPlayerInfo`.
#[derive(Clone, PartialEq, Message)]
pub struct CPlayerInfo {
    /// Hero unit name, e.g. `npc_dota_hero_axe`.
    #[prost(string, optional, tag = "1")]
    pub hero_name: Option<String>,

    /// Display name.
    #[prost(string, optional, tag = "2")]
    pub player_name: Option<String>,

    /// Whether the slot was a bot.
    #[prost(bool, optional, tag = "3")]
    pub is_fake_client: Option<bool>,

    /// 64-bit SteamID.
    #[prost(uint64, optional, tag = "4")]
    pub steamid: Option<u64>,

    /// Team number (2 or 3).
    #[prost(int32, optional, tag = "5")]
    pub game_team: Option<i32>,
}
