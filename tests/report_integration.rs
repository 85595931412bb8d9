//! Integration tests for the report pass against synthetic event streams.
//!
//! Every stream uses the same ten-player roster with alternating teams
//! (even slots on team 2, odd slots on team 3). Cursor positions are given in
//! the controller's native 510x383 space, exactly as a decoder reports them.

use std::io::Cursor;
use std::ops::ControlFlow;

use pretty_assertions::assert_eq;

use dota_report_parser::analysis::{parse_replay, ReportTarget};
use dota_report_parser::clock::GAME_START_STATE;
use dota_report_parser::config::ParserConfig;
use dota_report_parser::roster::{PLAYER_CONTROLLER_CLASS, PLAYER_RESOURCE_CLASS};
use dota_report_parser::stream::{
    EventSink, EventSource, RecordedEntity, RecordedSource, StreamError,
};
use dota_report_parser::{ParseResult, ParserError, Report, TeamLabel};

const BASE_STEAM_ID: u64 = 76_561_198_000_000_000;
const HEROES: [&str; 10] = [
    "Axe", "Lina", "Pudge", "Zuus", "Sven", "Lion", "Tiny", "Juggernaut", "Mirana", "Viper",
];

/// Native cursor y of each slot's report button.
const ROW_Y: [i32; 10] = [43, 67, 92, 117, 142, 177, 202, 227, 252, 277];
/// Native cursor x of the report button column at 16:9.
const BUTTON_X: i32 = 231;
/// Native cursor position of the confirmation button.
const CONFIRM: (i32, i32) = (266, 305);

const GAME_START_TICK: u32 = 1000;

fn steam_id(slot: usize) -> u64 {
    BASE_STEAM_ID + slot as u64
}

fn team(slot: usize) -> i32 {
    if slot % 2 == 0 {
        2
    } else {
        3
    }
}

fn name(slot: usize) -> String {
    format!("player{slot}")
}

fn player_resource() -> RecordedEntity {
    (0..10).fold(RecordedEntity::new(PLAYER_RESOURCE_CLASS, 1), |e, slot| {
        e.with(format!("m_vecPlayerData.{slot:04}.m_iPlayerSteamID"), steam_id(slot))
            .with(format!("m_vecPlayerData.{slot:04}.m_iPlayerTeam"), team(slot))
            .with(format!("m_vecPlayerData.{slot:04}.m_iszPlayerName"), name(slot))
    })
}

fn hero(slot: usize) -> RecordedEntity {
    RecordedEntity::new(format!("CDOTA_Unit_Hero_{}", HEROES[slot]), 300 + slot as u32)
        .with("m_iPlayerID", slot as i32)
}

fn controller(slot: usize, panel: i32, (x, y): (i32, i32)) -> RecordedEntity {
    RecordedEntity::new(PLAYER_CONTROLLER_CLASS, 100 + slot as u32)
        .with("m_nPlayerID", slot as i32)
        .with("m_steamID", steam_id(slot))
        .with("m_iszPlayerName", name(slot))
        .with("m_iTeamNum", team(slot))
        .with("m_iStatsPanel", panel)
        .with("m_iCursor.0000", x)
        .with("m_iCursor.0001", y)
        .with("m_flAspectRatio", 16.0f32 / 9.0)
}

fn hover(slot: usize, target: usize) -> RecordedEntity {
    controller(slot, 1, (BUTTON_X, ROW_Y[target]))
}

fn confirm(slot: usize) -> RecordedEntity {
    controller(slot, 1, CONFIRM)
}

/// A stream with the roster, heroes and game start already delivered.
fn started_stream() -> RecordedSource {
    let mut source = RecordedSource::default();
    source.tick(1).entity(player_resource());
    for slot in 0..10 {
        source.entity(hero(slot));
    }
    source.tick(GAME_START_TICK).game_state(GAME_START_STATE);
    source
}

fn run(source: &mut RecordedSource) -> ParseResult {
    parse_replay(7_700_000_001, source, ReportTarget::All, &ParserConfig::default()).unwrap()
}

// ============================================================================
// Confirmation Window
// ============================================================================

#[test]
fn test_confirm_within_window_reports_first_hover() {
    let hover_tick = 10_000;
    let mut source = started_stream();
    source
        .tick(hover_tick)
        .entity(hover(0, 3))
        .tick(hover_tick + 90)
        .entity(confirm(0));

    let result = run(&mut source);

    assert_eq!(result.reports.len(), 1);
    let report = &result.reports[0];
    assert_eq!(report.target_slot, 3);
    // (10000 - 1000) / 30 = 300 seconds
    assert_eq!(report.time, "05:00");
}

#[test]
fn test_confirm_after_window_is_ignored() {
    let hover_tick = 10_000;
    let mut source = started_stream();
    source
        .tick(hover_tick)
        .entity(hover(0, 3))
        .tick(hover_tick + 150)
        .entity(confirm(0));

    let result = run(&mut source);

    assert!(result.reports.is_empty());
    assert_eq!(result.team_report_count + result.enemy_report_count, 0);
}

#[test]
fn test_custom_confirm_window() {
    let mut source = started_stream();
    source
        .tick(5000)
        .entity(hover(2, 5))
        .tick(5150)
        .entity(confirm(2));

    let config = ParserConfig::default().with_confirm_window(200);
    let result = parse_replay(1, &mut source, ReportTarget::All, &config).unwrap();
    assert_eq!(result.reports.len(), 1);
}

#[test]
fn test_no_self_reports() {
    for slot in 0..10 {
        let mut source = started_stream();
        source
            .tick(4000)
            .entity(hover(slot, slot))
            .tick(4030)
            .entity(confirm(slot));

        let result = run(&mut source);
        assert!(result.reports.is_empty(), "slot {slot} reported itself");
    }
}

#[test]
fn test_first_hover_wins_over_later_hovers() {
    let mut source = started_stream();
    source
        .tick(6000)
        .entity(hover(4, 6))
        .tick(6010)
        .entity(hover(4, 8))
        .tick(6020)
        .entity(hover(4, 4))
        .tick(6060)
        .entity(confirm(4));

    let result = run(&mut source);

    assert_eq!(result.reports.len(), 1);
    assert_eq!(result.reports[0].target_slot, 6);
    assert_eq!(result.reports[0].reporter_team_label, TeamLabel::Friendly);
}

#[test]
fn test_closing_scoreboard_keeps_hover() {
    let mut source = started_stream();
    source
        .tick(7000)
        .entity(hover(1, 2))
        .tick(7020)
        .entity(controller(1, 0, (0, 0)))
        .tick(7040)
        .entity(confirm(1));

    let result = run(&mut source);
    assert_eq!(result.reports.len(), 1);
    assert_eq!(result.reports[0].target_slot, 2);
}

#[test]
fn test_each_hover_sequence_reports_once() {
    let mut source = started_stream();
    source
        .tick(8000)
        .entity(hover(0, 1))
        .tick(8030)
        .entity(confirm(0))
        .tick(8031)
        .entity(confirm(0))
        .tick(9000)
        .entity(hover(0, 7))
        .tick(9010)
        .entity(confirm(0));

    let result = run(&mut source);

    let targets: Vec<usize> = result.reports.iter().map(|r| r.target_slot).collect();
    assert_eq!(targets, vec![1, 7]);
    assert_eq!(result.enemy_report_count, 2);
}

// ============================================================================
// Result Shape
// ============================================================================

#[test]
fn test_alternating_teams_round_trip() {
    let mut source = started_stream();
    source
        .tick(GAME_START_TICK + 30 * 61)
        .entity(hover(0, 1))
        .tick(GAME_START_TICK + 30 * 62)
        .entity(confirm(0));

    let result = run(&mut source);

    let expected = ParseResult {
        match_id: 7_700_000_001,
        team_report_count: 0,
        enemy_report_count: 1,
        reports: vec![Report {
            time: "01:01".to_string(),
            reporter_steam_id: steam_id(0),
            reporter_slot: 0,
            reporter_name: "player0".to_string(),
            reporter_team_label: TeamLabel::Enemy,
            reporter_hero: "Axe".to_string(),
            target_slot: 1,
            target_steam_id: steam_id(1),
            target_name: "player1".to_string(),
            target_hero: "Lina".to_string(),
        }],
    };
    assert_eq!(result, expected);

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["enemy_report_count"], 1);
    assert_eq!(json["reports"][0]["reporter_team_label"], "ENEMY");
    assert_eq!(json["reports"][0]["time"], "01:01");
}

#[test]
fn test_zeroed_target_steam_id_uses_last_known() {
    let mut source = started_stream();
    source
        .tick(GAME_START_TICK + 10)
        .entity(
            RecordedEntity::new(PLAYER_RESOURCE_CLASS, 1)
                .with("m_vecPlayerData.0001.m_iPlayerSteamID", 0u64),
        )
        .tick(GAME_START_TICK + 20)
        .entity(hover(0, 1))
        .tick(GAME_START_TICK + 50)
        .entity(confirm(0));

    let result = run(&mut source);

    assert_eq!(result.reports.len(), 1);
    assert_eq!(result.reports[0].target_slot, 1);
    assert_eq!(result.reports[0].target_steam_id, steam_id(1));
    assert_eq!(result.reports[0].target_name, "player1");
}

#[test]
fn test_tracked_player_reports_are_excluded() {
    let mut base = started_stream();
    base.tick(3000)
        .entity(hover(3, 0))
        .entity(hover(5, 0))
        .tick(3050)
        .entity(confirm(3))
        .entity(confirm(5));

    let config = ParserConfig::default();

    let all = parse_replay(1, &mut base.clone(), ReportTarget::All, &config).unwrap();
    assert_eq!(all.reports.len(), 2);

    let by_slot = parse_replay(1, &mut base.clone(), ReportTarget::Slot(3), &config).unwrap();
    let reporters: Vec<usize> = by_slot.reports.iter().map(|r| r.reporter_slot).collect();
    assert_eq!(reporters, vec![5]);

    let by_steam = parse_replay(1, &mut base, ReportTarget::SteamId(steam_id(5)), &config).unwrap();
    let reporters: Vec<usize> = by_steam.reports.iter().map(|r| r.reporter_slot).collect();
    assert_eq!(reporters, vec![3]);
}

#[test]
fn test_hero_backfilled_after_pass() {
    let mut source = RecordedSource::default();
    source
        .tick(1)
        .entity(player_resource())
        .tick(GAME_START_TICK)
        .game_state(GAME_START_STATE)
        .tick(2000)
        .entity(hover(6, 9))
        .tick(2010)
        .entity(confirm(6))
        .tick(2500)
        .entity(hero(6))
        .entity(hero(9));

    let result = run(&mut source);

    assert_eq!(result.reports.len(), 1);
    assert_eq!(result.reports[0].reporter_hero, "Tiny");
    assert_eq!(result.reports[0].target_hero, "Viper");
}

#[test]
fn test_recorded_json_lines_stream() {
    let lines = [
        r#"{"type":"tick","tick":1}"#.to_string(),
        serde_json::to_string(&dota_report_parser::stream::RecordedEvent::Entity(
            player_resource(),
        ))
        .unwrap(),
        r#"{"type":"tick","tick":1000}"#.to_string(),
        r#"{"type":"game_state","state":5}"#.to_string(),
        r#"{"type":"tick","tick":1300}"#.to_string(),
        format!(
            r#"{{"type":"entity","class":"CDOTAPlayerController","index":108,"fields":{{"m_steamID":{},"m_iszPlayerName":"player8","m_iTeamNum":2,"m_iStatsPanel":1,"m_iCursor.0000":231,"m_iCursor.0001":43,"m_flAspectRatio":1.7777778}}}}"#,
            steam_id(8)
        ),
        r#"{"type":"tick","tick":1330}"#.to_string(),
        format!(
            r#"{{"type":"entity","class":"CDOTAPlayerController","index":108,"fields":{{"m_steamID":{},"m_iszPlayerName":"player8","m_iTeamNum":2,"m_iStatsPanel":1,"m_iCursor.0000":266,"m_iCursor.0001":305,"m_flAspectRatio":1.7777778}}}}"#,
            steam_id(8)
        ),
    ];
    let mut source = RecordedSource::from_reader(Cursor::new(lines.join("\n"))).unwrap();

    let result = run(&mut source);

    assert_eq!(result.reports.len(), 1);
    assert_eq!(result.reports[0].reporter_slot, 8);
    assert_eq!(result.reports[0].target_slot, 0);
    assert_eq!(result.reports[0].time, "00:10");
    assert_eq!(result.team_report_count, 1);
}

// ============================================================================
// Stream Failures
// ============================================================================

#[test]
fn test_decoder_fault_is_corrupt_stream() {
    let mut source = started_stream();
    source
        .tick(5000)
        .entity(hover(0, 3))
        .tick(5010)
        .fault("insufficient buffer");

    let err = parse_replay(1, &mut source, ReportTarget::All, &ParserConfig::default())
        .unwrap_err();

    match err {
        ParserError::CorruptStream { tick, reason, .. } => {
            assert_eq!(tick, 5010);
            assert_eq!(reason, "insufficient buffer");
        }
        other => panic!("expected CorruptStream, got {other:?}"),
    }
}

/// A decoder that panics part way through the stream.
struct PanickingSource;

impl EventSource for PanickingSource {
    fn drive(&mut self, sink: &mut dyn EventSink) -> Result<(), StreamError> {
        for tick in [1, 2, 3] {
            if let ControlFlow::Break(()) = sink.on_tick(tick)? {
                return Ok(());
            }
        }
        panic!("entity index out of range");
    }
}

#[test]
fn test_decoder_panic_is_corrupt_stream() {
    let err = parse_replay(1, &mut PanickingSource, ReportTarget::All, &ParserConfig::default())
        .unwrap_err();

    assert!(matches!(
        err,
        ParserError::CorruptStream { tick: 3, ref reason, .. } if reason.contains("entity index out of range")
    ));
}
