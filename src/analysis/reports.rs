//! The report detection pass.

use std::ops::ControlFlow;

use tracing::{debug, info};

use super::{drive_pass, PassDiagnostics, PassSink, ReportTarget};
use crate::clock::{MatchClock, GAME_START_STATE};
use crate::config::ParserConfig;
use crate::error::Result;
use crate::report::{ParseResult, Reporter};
use crate::roster::{Roster, GAMERULES_CLASS, PLAYER_CONTROLLER_CLASS, PLAYER_RESOURCE_CLASS};
use crate::scoreboard::HoverTracker;
use crate::stream::{EntityOp, EntitySnapshot, EventSink, EventSource, PacketMarker, Tick};

const PAUSED_TICKS_FIELD: &str = "m_pGameRules.m_nTotalPausedTicks";

/// Reconstructs report actions from a replay's event stream.
///
/// Controllers belonging to the player selected by `target` are never
/// treated as reporters. The roster and the pause counter are tracked from
/// the first event; scoreboard activity only counts once the game has
/// started. After the stream ends, heroes still missing are resolved through
/// the fallback chain of [`Roster::resolve_missing_heroes`] and copied into
/// reports that were made before the hero was known.
///
/// # Errors
///
/// - [`ParserError::CorruptStream`](crate::ParserError::CorruptStream) if the
///   decoder fails or the pass panics
/// - any error raised while handling an event
///
/// # Example
///
/// ```
/// use dota_report_parser::analysis::{parse_replay, ReportTarget};
/// use dota_report_parser::config::ParserConfig;
/// use dota_report_parser::stream::RecordedSource;
///
/// let mut source = RecordedSource::default();
/// source.tick(1).game_state(5).tick(2);
///
/// let result = parse_replay(42, &mut source, ReportTarget::All, &ParserConfig::default())?;
/// assert_eq!(result.match_id, 42);
/// assert!(result.reports.is_empty());
/// # Ok::<(), dota_report_parser::ParserError>(())
/// ```
pub fn parse_replay<S>(
    match_id: i64,
    source: &mut S,
    target: ReportTarget,
    config: &ParserConfig,
) -> Result<ParseResult>
where
    S: EventSource + ?Sized,
{
    info!(match_id, target = %target, "starting report pass");

    let mut pass = ReportPass::new(match_id, target, config);
    drive_pass(source, &mut pass)?;

    let ReportPass {
        mut roster,
        mut result,
        clock,
        diagnostics,
        tracked_slot,
        tracked_steam_id,
        ..
    } = pass;

    roster.resolve_missing_heroes(|handle| source.class_for_handle(handle));
    result.backfill_heroes(&roster);

    info!(
        match_id,
        begin_tick = ?clock.begin_tick(),
        paused_ticks = clock.paused_ticks(),
        final_tick = diagnostics.current_tick,
        tracked_slot = ?tracked_slot,
        tracked_steam_id = ?tracked_steam_id,
        team_reports = result.team_report_count,
        enemy_reports = result.enemy_report_count,
        "report pass finished"
    );
    Ok(result)
}

struct ReportPass {
    target: ReportTarget,
    tracked_slot: Option<usize>,
    tracked_steam_id: Option<u64>,
    clock: MatchClock,
    roster: Roster,
    hover: HoverTracker,
    result: ParseResult,
    diagnostics: PassDiagnostics,
}

impl ReportPass {
    fn new(match_id: i64, target: ReportTarget, config: &ParserConfig) -> Self {
        let (tracked_slot, tracked_steam_id) = match target {
            ReportTarget::All => (None, None),
            ReportTarget::Slot(slot) => (Some(slot), None),
            ReportTarget::SteamId(steam_id) => (None, Some(steam_id)),
        };
        ReportPass {
            target,
            tracked_slot,
            tracked_steam_id,
            clock: MatchClock::new(),
            roster: Roster::new(),
            hover: HoverTracker::new(config.layout.clone(), config.confirm_window_ticks),
            result: ParseResult::new(match_id),
            diagnostics: PassDiagnostics::default(),
        }
    }

    /// Fills in whichever half of the tracked player is learned from the
    /// roster.
    fn update_tracked_player(&mut self) {
        match self.target {
            ReportTarget::All => {}
            ReportTarget::Slot(slot) => {
                let steam_id = self
                    .roster
                    .player(slot)
                    .map(|p| p.steam_id)
                    .filter(|id| *id != 0);
                if steam_id.is_some() && steam_id != self.tracked_steam_id {
                    info!(slot, steam_id = ?steam_id, "found reported player by slot");
                    self.tracked_steam_id = steam_id;
                }
            }
            ReportTarget::SteamId(steam_id) => {
                let slot = self.roster.slot_by_steam_id(steam_id);
                if slot.is_some() && slot != self.tracked_slot {
                    info!(slot = ?slot, steam_id, "found reported player by SteamID");
                    self.tracked_slot = slot;
                }
            }
        }
    }

    fn observe_controller(&mut self, entity: &dyn EntitySnapshot) {
        let (Some(steam_id), Some(name)) = (
            entity.get_u64("m_steamID"),
            entity.get_str("m_iszPlayerName"),
        ) else {
            return;
        };
        if self.tracked_steam_id == Some(steam_id) {
            return;
        }

        let open = match entity.get_i32("m_iStatsPanel") {
            Some(1) => true,
            Some(0) => false,
            _ => return,
        };
        let toggled = self.hover.set_panel(steam_id, open);
        if toggled {
            debug!(steam_id, open, tick = self.diagnostics.current_tick, "scoreboard toggled");
        }
        if !open {
            return;
        }

        let (Some(x), Some(y), Some(aspect)) = (
            entity.get_i32("m_iCursor.0000"),
            entity.get_i32("m_iCursor.0001"),
            entity.get_f32("m_flAspectRatio"),
        ) else {
            return;
        };
        let Some(slot) = self.roster.slot_by_steam_id(steam_id) else {
            return;
        };

        let cursor = self.hover.layout().to_canonical(x, y);
        let tick = self.diagnostics.current_tick;
        let Some(intent) = self.hover.observe(slot, cursor, aspect, tick) else {
            return;
        };

        let team = entity
            .get_i32("m_iTeamNum")
            .or_else(|| self.roster.player(slot).map(|p| p.team))
            .unwrap_or_default();
        let reporter = Reporter {
            steam_id,
            name,
            team,
        };
        if self
            .result
            .confirm(&intent, &reporter, &self.roster, &self.clock)
            .is_some()
        {
            self.hover.complete(slot);
        }
    }
}

impl EventSink for ReportPass {
    fn on_tick(&mut self, tick: Tick) -> Result<ControlFlow<()>> {
        self.diagnostics.observe_tick(tick);
        Ok(ControlFlow::Continue(()))
    }

    fn on_game_state(&mut self, state: i32) -> Result<()> {
        if state == GAME_START_STATE {
            let tick = self.diagnostics.current_tick;
            if self.clock.start(tick) {
                info!(begin_tick = tick, "game started");
            } else {
                debug!(tick, "game start repeated, keeping first begin tick");
            }
        }
        Ok(())
    }

    fn on_entity(&mut self, entity: &dyn EntitySnapshot, _op: EntityOp) -> Result<()> {
        let class = entity.class_name();

        if class == GAMERULES_CLASS {
            if let Some(paused) = entity.get_i32(PAUSED_TICKS_FIELD) {
                self.clock.set_paused_ticks(paused);
            }
            return Ok(());
        }

        self.roster.observe(entity);
        if class == PLAYER_RESOURCE_CLASS {
            self.update_tracked_player();
        }

        if class == PLAYER_CONTROLLER_CLASS && self.clock.is_started() {
            self.observe_controller(entity);
        }
        Ok(())
    }

    fn on_packet(&mut self, marker: PacketMarker) {
        self.diagnostics.observe_packet(marker);
    }
}

impl PassSink for ReportPass {
    fn diagnostics(&self) -> &PassDiagnostics {
        &self.diagnostics
    }
}
