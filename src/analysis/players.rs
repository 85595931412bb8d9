//! The roster-only pass.

use std::ops::ControlFlow;

use tracing::{debug, info, warn};

use super::{drive_pass, PassDiagnostics, PassSink};
use crate::config::ParserConfig;
use crate::error::{ParserError, Result};
use crate::roster::{PlayerResource, Roster, SLOT_COUNT};
use crate::stream::{EntityOp, EntitySnapshot, EventSink, EventSource, PacketMarker, Tick};

/// Resolves the ten-slot roster without looking for reports.
///
/// The pass stops as soon as every named slot has a hero. If the stream
/// passes `config.resolution_tick_limit` first, the post-pass hero fallbacks
/// still run; the roster is returned only if they complete it. A stream that
/// ends before the limit returns whatever was resolved.
///
/// # Errors
///
/// - [`ParserError::ResolutionTimeout`] if the tick limit was exceeded and
///   the roster is still incomplete
/// - [`ParserError::CorruptStream`] if the decoder fails or the pass panics
pub fn extract_player_info<S>(
    source: &mut S,
    config: &ParserConfig,
) -> Result<[PlayerResource; SLOT_COUNT]>
where
    S: EventSource + ?Sized,
{
    let mut pass = RosterPass {
        roster: Roster::new(),
        tick_limit: config.resolution_tick_limit,
        timed_out: false,
        diagnostics: PassDiagnostics::default(),
    };
    drive_pass(source, &mut pass)?;

    let RosterPass {
        mut roster,
        timed_out,
        diagnostics,
        tick_limit,
    } = pass;
    roster.resolve_missing_heroes(|handle| source.class_for_handle(handle));

    if timed_out && !roster.is_complete() {
        warn!(
            tick = diagnostics.current_tick,
            max_ticks = tick_limit,
            has_player_data = roster.has_player_data(),
            "roster incomplete at tick limit"
        );
        return Err(ParserError::ResolutionTimeout {
            max_ticks: tick_limit,
        });
    }

    info!(
        tick = diagnostics.current_tick,
        complete = roster.is_complete(),
        "roster pass finished"
    );
    Ok(roster.into_players())
}

struct RosterPass {
    roster: Roster,
    tick_limit: u32,
    timed_out: bool,
    diagnostics: PassDiagnostics,
}

impl EventSink for RosterPass {
    fn on_tick(&mut self, tick: Tick) -> Result<ControlFlow<()>> {
        self.diagnostics.observe_tick(tick);
        if self.roster.is_complete() {
            debug!(tick, "roster complete, stopping early");
            return Ok(ControlFlow::Break(()));
        }
        if tick > self.tick_limit {
            self.timed_out = true;
            return Ok(ControlFlow::Break(()));
        }
        Ok(ControlFlow::Continue(()))
    }

    fn on_game_state(&mut self, _state: i32) -> Result<()> {
        Ok(())
    }

    fn on_entity(&mut self, entity: &dyn EntitySnapshot, _op: EntityOp) -> Result<()> {
        self.roster.observe(entity);
        Ok(())
    }

    fn on_packet(&mut self, marker: PacketMarker) {
        self.diagnostics.observe_packet(marker);
    }
}

impl PassSink for RosterPass {
    fn diagnostics(&self) -> &PassDiagnostics {
        &self.diagnostics
    }
}
